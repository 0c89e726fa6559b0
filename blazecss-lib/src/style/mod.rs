pub mod aggregate;
pub mod blaze_css;
pub mod owned_css;
pub mod selector;
