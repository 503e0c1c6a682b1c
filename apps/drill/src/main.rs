fn main() -> anyhow::Result<()> {
    drill::run()
}
