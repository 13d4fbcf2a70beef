pub mod descriptor;
pub mod payload;
pub mod selector;
pub mod validator;
