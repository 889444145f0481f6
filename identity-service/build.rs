// Build script for identity-service
// Compiles identity.proto for gRPC server and client code generation
fn main() {
    println!("cargo:rerun-if-changed=proto/identity.proto");

    // Source a protoc binary from the vendored crate when one is not already
    // provided on the host, so the proto compiles without a system install.
    if std::env::var_os("PROTOC").is_none() {
        if let Ok(path) = protoc_bin_vendored::protoc_bin_path() {
            std::env::set_var("PROTOC", path);
        }
    }

    // Client code is also generated for integration tests
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["proto/identity.proto"], &["proto"])
        .expect("Failed to compile identity.proto for identity-service");
}
