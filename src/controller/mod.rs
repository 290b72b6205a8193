mod context;
mod controller;
mod endpoints;
mod protocols;
mod resize;
mod view;


pub use controller::ReplicaSetController;
pub use resize::ResizeError;
