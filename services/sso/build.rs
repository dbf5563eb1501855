//! Compiles the `sso.v1` protobuf definitions.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let proto = "proto/sso.proto";

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&[proto], &["proto"])?;

    println!("cargo:rerun-if-changed={proto}");
    Ok(())
}
