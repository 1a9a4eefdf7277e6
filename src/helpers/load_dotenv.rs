pub fn load_dotenv() {
    if dotenv::dotenv().is_ok() {
        eprintln!("Loaded local .env")
    }
}
