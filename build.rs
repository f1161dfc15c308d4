fn main() {
    println!("cargo:rerun-if-env-changed=ERIC_LIB_DIR");

    // Link to libericapi only when the "native" feature is enabled.
    #[cfg(feature = "native")]
    {
        let lib_dir = std::env::var("ERIC_LIB_DIR").unwrap_or_else(|_| {
            let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_default();
            std::path::Path::new(&manifest_dir)
                .join("lib")
                .display()
                .to_string()
        });
        println!("cargo:rustc-link-search=native={lib_dir}");

        let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
        match target_os.as_str() {
            "macos" | "linux" => {
                println!("cargo:rustc-link-lib=dylib=ericapi");
                println!("cargo:rustc-link-arg=-Wl,-rpath,{lib_dir}");
            }
            other => {
                panic!("Unsupported target OS: {other}. ERiC is only linked on macOS and Linux.");
            }
        }
    }
}
