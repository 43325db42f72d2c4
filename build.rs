fn main() {
  println!("cargo:rerun-if-changed=build.rs");
  println!("cargo:rerun-if-env-changed=KEEFA_TEST_DATABASE_URI");
  println!("cargo:rustc-check-cfg=cfg(database_tests)");
  if std::env::var_os("KEEFA_TEST_DATABASE_URI").is_some() {
    println!("cargo:rustc-cfg=database_tests");
  }
}
