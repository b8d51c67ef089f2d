use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    sidenote::cli::main()
}
