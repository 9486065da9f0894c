/*! The drawing component of shapes_and_passes */

pub mod device;
pub mod shape;
pub mod shader;
pub mod index_algorithms;
pub mod vertex_layout;
pub mod vertex_algorithms;
pub mod geometry;
pub mod draw_operation;
pub mod frame_driver;

pub use draw_operation::DrawOperation;
pub use frame_driver::FrameDriver;
