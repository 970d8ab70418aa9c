//! File transfer.
//!
//! Outgoing files start paused until the receiver accepts; chunks are then
//! requested through `FileChunkRequest` events and answered with
//! [`Tox::file_send_chunk`].

use tox4rs_protocol::{
    FileControl, FileId, FileNumber, FriendNumber, MAX_FILENAME_LENGTH, MAX_FILE_CHUNK,
};

use super::within;
use crate::codes::{FileControlCode, FileGetCode, FileSeekCode, FileSendChunkCode, FileSendCode};
use crate::engine::CoreEngine;
use crate::error::{StatusExt, ToxError};
use crate::session::Tox;

impl<E: CoreEngine> Tox<E> {
    pub fn file_control(
        &self,
        friend: FriendNumber,
        file: FileNumber,
        control: FileControl,
    ) -> Result<(), ToxError<FileControlCode>> {
        self.invoke(|engine| engine.file_control(friend, file, control).mapped())
    }

    /// Move the read position of an incoming transfer before it starts.
    pub fn file_seek(
        &self,
        friend: FriendNumber,
        file: FileNumber,
        position: u64,
    ) -> Result<(), ToxError<FileSeekCode>> {
        self.invoke(|engine| engine.file_seek(friend, file, position).mapped())
    }

    pub fn file_file_id(
        &self,
        friend: FriendNumber,
        file: FileNumber,
    ) -> Result<FileId, ToxError<FileGetCode>> {
        self.invoke(|engine| engine.file_file_id(friend, file).mapped())
    }

    /// Offer a file. `kind` is one of [`tox4rs_protocol::file_kind`]; a
    /// missing `file_id` is generated by the engine.
    pub fn file_send(
        &self,
        friend: FriendNumber,
        kind: u32,
        file_size: u64,
        file_id: Option<&FileId>,
        filename: &[u8],
    ) -> Result<FileNumber, ToxError<FileSendCode>> {
        self.invoke(|engine| {
            within(filename.len(), MAX_FILENAME_LENGTH, FileSendCode::NameTooLong)?;
            engine
                .file_send(friend, kind, file_size, file_id, filename)
                .mapped()
        })
    }

    pub fn file_send_chunk(
        &self,
        friend: FriendNumber,
        file: FileNumber,
        position: u64,
        data: &[u8],
    ) -> Result<(), ToxError<FileSendChunkCode>> {
        self.invoke(|engine| {
            within(data.len(), MAX_FILE_CHUNK, FileSendChunkCode::InvalidLength)?;
            engine.file_send_chunk(friend, file, position, data).mapped()
        })
    }
}
