fn main() -> anyhow::Result<()> {
    ltv_engine::run()?;
    Ok(())
}
