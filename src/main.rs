#[rocket::launch]
fn rocket() -> _ {
  keefa_api::server()
}
