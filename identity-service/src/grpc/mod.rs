/// gRPC server module for the identity service
///
/// Exports:
/// - IdentityServiceServer: gRPC service implementation
/// - atrium: Generated protobuf types from identity.proto
pub mod server;

pub use server::atrium;
pub use server::IdentityServiceServer;
