fn main() {
    std::process::exit(awsgen::run_cli(std::env::args().collect()));
}
