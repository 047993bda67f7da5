fn main() -> anyhow::Result<()> {
    stratbench_cli::run()
}
