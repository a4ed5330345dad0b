use sizeroller::{LogSinkBuilder, RotationSize};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logger = LogSinkBuilder::new("./logs/sized.log")
        .max_size(RotationSize::KB(64)) // Rotate before the file grows past 64KB
        .backup_count(5) // Keep only the last 5 files
        .file_mode(0o640) // Set file permissions to: owner rw, group r, others none
        .build()?;

    // Simulate writing logs that will trigger size-based rotation
    for i in 1..=5000 {
        let line = format!("Log entry #{i}: This is a sample log message that will contribute to file size\n");
        logger.write(line.as_bytes())?;
    }

    for backup in logger.backups()? {
        println!("{}", backup.display());
    }
    logger.close()?;
    Ok(())
}
