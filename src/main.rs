fn main() -> anyhow::Result<()> {
    segment_filter::run()
}
