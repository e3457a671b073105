fn main() {
    asdl::cli::run();
}
