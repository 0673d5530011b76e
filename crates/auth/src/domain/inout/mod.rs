pub mod signin;

pub mod prelude {
    pub use super::signin::*;
}
