//! HTML views rendered with askama templates from `templates/`.

pub mod views;
