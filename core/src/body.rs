//! Request payloads that can be read for hashing and then read again for
//! transmission.

use std::fmt::Debug;
use std::fmt::Formatter;
use std::io;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::io::Write;

use bytes::Bytes;

use crate::Error;
use crate::Result;

/// Payload is the body of a request as seen by a signer.
///
/// Signers read the whole payload once to hash it. Implementations must leave
/// the payload readable again from the same position afterwards, or return a
/// [`ErrorKind::SigningIo`](crate::ErrorKind::SigningIo) error when they can't.
pub trait Payload {
    /// Returns true if the request carries no body at all.
    fn is_absent(&self) -> bool;

    /// Copy the full payload into `w` and rewind it.
    ///
    /// Returns the number of bytes copied.
    fn copy_to(&mut self, w: &mut dyn Write) -> Result<u64>;
}

impl Payload for () {
    fn is_absent(&self) -> bool {
        true
    }

    fn copy_to(&mut self, _: &mut dyn Write) -> Result<u64> {
        Ok(0)
    }
}

impl Payload for &str {
    fn is_absent(&self) -> bool {
        str::is_empty(self)
    }

    fn copy_to(&mut self, w: &mut dyn Write) -> Result<u64> {
        copy_slice(self.as_bytes(), w)
    }
}

impl Payload for String {
    fn is_absent(&self) -> bool {
        String::is_empty(self)
    }

    fn copy_to(&mut self, w: &mut dyn Write) -> Result<u64> {
        copy_slice(self.as_bytes(), w)
    }
}

impl Payload for &[u8] {
    fn is_absent(&self) -> bool {
        <[u8]>::is_empty(self)
    }

    fn copy_to(&mut self, w: &mut dyn Write) -> Result<u64> {
        copy_slice(self, w)
    }
}

impl Payload for Vec<u8> {
    fn is_absent(&self) -> bool {
        Vec::is_empty(self)
    }

    fn copy_to(&mut self, w: &mut dyn Write) -> Result<u64> {
        copy_slice(self, w)
    }
}

impl Payload for Bytes {
    fn is_absent(&self) -> bool {
        Bytes::is_empty(self)
    }

    fn copy_to(&mut self, w: &mut dyn Write) -> Result<u64> {
        copy_slice(self, w)
    }
}

fn copy_slice(bs: &[u8], w: &mut dyn Write) -> Result<u64> {
    w.write_all(bs)?;
    Ok(bs.len() as u64)
}

/// ReadSeek is a stream that can be rewound.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// Body is an owned request body.
#[derive(Default)]
pub enum Body {
    /// No body.
    #[default]
    Empty,
    /// An in-memory body.
    Bytes(Bytes),
    /// A stream that can be rewound after reading, like a file or a cursor.
    Stream(Box<dyn ReadSeek + Send>),
    /// A stream that can only be read once.
    ///
    /// Signing a request with such a body fails since its content
    /// can't be hashed without consuming it.
    OneShot(Box<dyn Read + Send>),
}

impl Body {
    /// Create a body from a rewindable stream.
    pub fn stream(r: impl Read + Seek + Send + 'static) -> Self {
        Body::Stream(Box::new(r))
    }

    /// Create a body from a stream that can only be read once.
    pub fn one_shot(r: impl Read + Send + 'static) -> Self {
        Body::OneShot(Box::new(r))
    }
}

impl Debug for Body {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Body::Empty => f.write_str("Body::Empty"),
            Body::Bytes(bs) => write!(f, "Body::Bytes({} bytes)", bs.len()),
            Body::Stream(_) => f.write_str("Body::Stream"),
            Body::OneShot(_) => f.write_str("Body::OneShot"),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bs: Bytes) -> Self {
        Body::Bytes(bs)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bs: Vec<u8>) -> Self {
        Body::Bytes(bs.into())
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::Bytes(s.into())
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        Body::Bytes(Bytes::from_static(s.as_bytes()))
    }
}

impl Payload for Body {
    fn is_absent(&self) -> bool {
        match self {
            Body::Empty => true,
            Body::Bytes(bs) => bs.is_empty(),
            Body::Stream(_) | Body::OneShot(_) => false,
        }
    }

    fn copy_to(&mut self, w: &mut dyn Write) -> Result<u64> {
        match self {
            Body::Empty => Ok(0),
            Body::Bytes(bs) => copy_slice(bs, w),
            Body::Stream(s) => {
                let mut guard = Rewind::mark(s.as_mut())?;
                let n = io::copy(guard.stream(), w)?;
                guard.reset()?;
                Ok(n)
            }
            Body::OneShot(_) => Err(Error::signing_io(
                "request body is a one-shot stream and can't be rewound after hashing",
            )),
        }
    }
}

/// Rewind records a stream position and seeks back to it when dropped.
///
/// `reset` performs the seek explicitly so that its error can be reported;
/// the drop path covers early returns and unwinding.
struct Rewind<'a> {
    stream: &'a mut (dyn ReadSeek + Send),
    position: u64,
    armed: bool,
}

impl<'a> Rewind<'a> {
    fn mark(stream: &'a mut (dyn ReadSeek + Send)) -> Result<Self> {
        let position = stream.stream_position().map_err(|e| {
            Error::signing_io("failed to mark request body position").with_source(e)
        })?;

        Ok(Self {
            stream,
            position,
            armed: true,
        })
    }

    fn stream(&mut self) -> &mut (dyn ReadSeek + Send) {
        self.stream
    }

    fn reset(mut self) -> Result<()> {
        self.armed = false;
        self.stream
            .seek(SeekFrom::Start(self.position))
            .map_err(|e| Error::signing_io("failed to reset request body").with_source(e))?;
        Ok(())
    }
}

impl Drop for Rewind<'_> {
    fn drop(&mut self) {
        if self.armed {
            let _ = self.stream.seek(SeekFrom::Start(self.position));
        }
    }
}
