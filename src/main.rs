use loadtester::error::AppResult;

fn main() -> AppResult<()> {
    loadtester::entry::run()
}
