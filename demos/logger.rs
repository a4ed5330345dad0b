use {
    sizeroller::{LogSinkBuilder, RotationSize},
    std::io::Write,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut logger = LogSinkBuilder::new("./logs/logger.log")
        .max_size(RotationSize::KB(256))
        .backup_count(3)
        .build()?;

    // One write per line keeps every line whole across rotations.
    logger.write_all(b"This is an info message\n")?;
    logger.write_all(b"This is a warning message\n")?;
    logger.write_all(b"This is an error message\n")?;

    logger.close()?;
    Ok(())
}
