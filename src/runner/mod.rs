pub mod compiler;
pub mod delegation;
pub mod dispatch;
pub mod ds;
pub mod realm;
