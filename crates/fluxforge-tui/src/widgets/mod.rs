//! Small reusable render helpers shared by screens.

pub mod form;
pub mod sub_tabs;
