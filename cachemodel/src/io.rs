use std::fs::File;
use std::io::BufRead;

use crate::error::TraceError;

/// Opens a trace file for sequential reading
pub fn get_reader(file: File) -> Result<Box<dyn BufRead>, TraceError> {
    // Compatibility on other systems
    #[cfg(not(unix))]
    {
        use std::io::BufReader;
        // 4096 is the standard block size (or a divisor of it) on most systems
        const BUFFER_SIZE: usize = 64 * 4096;
        Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, file)))
    }
    // Memory map the file for speed on unix systems
    #[cfg(unix)]
    {
        use memmap2::{Advice, Mmap};
        use std::io::Cursor;
        // Empty files can't be mapped
        if file.metadata()?.len() == 0 {
            return Ok(Box::new(Cursor::new(Vec::new())));
        }
        // SAFETY: the mapping is read only, and trace files are not modified while they are
        // replayed
        let mmap = unsafe { Mmap::map(&file)? };
        mmap.advise(Advice::Sequential)?;
        Ok(Box::new(Cursor::new(mmap)))
    }
}
