pub mod session_bo;
