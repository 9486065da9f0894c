/*! Defines binding types */

pub mod sampler;
pub mod bind_style;
pub mod layout_builder;
pub mod visible_to;
pub mod buffer_types;
