fn main() {
    console_error_panic_hook::set_once();
    if let Err(err) = run() {
        log::error!("{err:?}");
    }
}

fn run() -> anyhow::Result<()> {
    folio_web::console::init();
    folio_web::boot()
}
