//! Struct archiving functionality
//!
//! To add archiving functionality to a struct implement the `Archived` trait.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use std::fs::{File, OpenOptions};
use std::path::Path;
use csv::WriterBuilder;
pub use csv::Writer;
use serde::Serialize;
use thiserror::Error;

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An object used to write CSV archive files.
#[derive(Default)]
pub struct Archiver {
    writer: Option<Writer<File>>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur while archiving.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Could not open the archive file: {0}")]
    FileError(std::io::Error),

    #[error("Could not write the record: {0}")]
    WriteError(csv::Error),

    #[error("Could not flush the archive: {0}")]
    FlushError(std::io::Error),

    #[error("The archiver has not been initialised")]
    NotInitialised
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A trait which enables a struct to be archived as a csv.
///
/// To implement this trait, the struct shall have an `Archiver` member which
/// shall be ignored by Serde using `#[serde(skip_serializing)]`. The archiver
/// member shall be setup in the struct's `init` or `new` functions. 
pub trait Archived {
    /// Write the archives for this struct
    fn write(&mut self) -> Result<(), ArchiveError>;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Archiver {
    /// Create a new archiver from a paricular path relative to the session's
    /// archive root.
    pub fn from_path<P: AsRef<Path>>(
        session: &Session, path: P
    ) -> Result<Self, ArchiveError> {
        let mut session_path = session.arch_root.clone();
        session_path.push(path);

        // Create the parent directory if it does not exist
        if let Some(parent) = session_path.parent() {
            std::fs::create_dir_all(parent).map_err(ArchiveError::FileError)?;
        }
        
        // Create the file if it does not exist
        File::create(session_path.clone()).map_err(ArchiveError::FileError)?;

        // Open the file in append mode
        let file = OpenOptions::new()
            .append(true)
            .open(session_path)
            .map_err(ArchiveError::FileError)?;

        let w = WriterBuilder::new()
            .has_headers(true)
            .from_writer(file);

        Ok(Self {
            writer: Some(w)
        })
    }

    /// Serialise a record into the archive.
    pub fn serialise<T: Serialize>(&mut self, record: T) -> Result<(), ArchiveError> {
        match self.writer {
            Some(ref mut w) => {
                w.serialize(record).map_err(ArchiveError::WriteError)?;
                w.flush().map_err(ArchiveError::FlushError)
            },
            None => Err(ArchiveError::NotInitialised)
        }
    }
}
