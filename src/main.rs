#[tokio::main]
async fn main() {
    if let Err(err) = unit_timetable::run().await {
        eprintln!("fatal: {err}");
        std::process::exit(1);
    }
}
