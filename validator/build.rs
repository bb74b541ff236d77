fn main() {
    // Supply a protoc binary when the environment doesn't provide one, so the
    // proto compilation step works on hosts without a system-installed protoc.
    if std::env::var_os("PROTOC").is_none() {
        if let Ok(path) = protoc_bin_vendored::protoc_bin_path() {
            std::env::set_var("PROTOC", path);
        }
    }
    tonic_build::configure()
        .compile_protos(&["proto/translation.proto"], &["proto"])
        .unwrap_or_else(|e| {
            panic!("Failed to compile protos {:?}", e);
        });
}
