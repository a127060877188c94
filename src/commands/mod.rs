pub mod compare;
pub mod observe;
