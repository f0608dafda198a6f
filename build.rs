fn main() {
    // Stamp the build date into the binary
    let stamp = chrono::Utc::now().format("%Y-%m-%d %H:%M UTC").to_string();
    println!("cargo:rustc-env=BUILD_DATE={}", stamp);
}
