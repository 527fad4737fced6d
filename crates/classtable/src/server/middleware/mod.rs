pub mod session_validator;
