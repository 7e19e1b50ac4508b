fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Source protoc from the vendored binary so the build does not depend on
    // a system-installed protobuf compiler.
    if std::env::var_os("PROTOC").is_none() {
        std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);
    }
    tonic_build::configure()
        .build_server(true)
        .compile_protos(&["proto/designassistant.proto"], &["proto"])?;
    Ok(())
}
