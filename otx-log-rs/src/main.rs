fn main() {
    otx_log::cli::run();
}
