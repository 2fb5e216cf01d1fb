use io_impl::RealIo;
use sptr_lib::app::run;

fn main() -> std::io::Result<()> {
    env_logger::init();
    let result = run(&RealIo());
    if let Err(e) = &result {
        log::error!("{}", e);
    }
    result
}
