// Chorale
// Copyright (c) 2026 The Project Chorale Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::any::Any;
use std::fmt;
use std::io;

use chorale_core::audio::Channels;
use chorale_core::codecs::AudioFormat;
use chorale_core::errors::{validation_error, Result};
use chorale_core::io::{ReadBytes, WriteBytes};
use chorale_format_riff::{read_payload, Chunk, ChunkHeader, ChunkType};

/// The trailing 12 bytes shared by all `KSDATAFORMAT_SUBTYPE_*` GUIDs. The leading 4 bytes hold the
/// WAVE format tag of the sub-format, little-endian. These definitions can be found in ksmedia.h of
/// the Microsoft Windows Platform SDK.
#[rustfmt::skip]
const KSDATAFORMAT_SUBTYPE_SUFFIX: [u8; 12] = [
    0x00, 0x00, 0x10, 0x00, 0x80, 0x00, 0x00, 0xaa, 0x00, 0x38, 0x9b, 0x71,
];

/// Builds the sub-format GUID of a WAVE format tag.
pub fn sub_format_guid(format: u16) -> [u8; 16] {
    let mut guid = [0u8; 16];
    guid[0..2].copy_from_slice(&format.to_le_bytes());
    guid[4..16].copy_from_slice(&KSDATAFORMAT_SUBTYPE_SUFFIX);
    guid
}

/// Gets the WAVE format tag of a sub-format GUID, if the GUID is one of the WAVE format GUIDs.
fn sub_format_tag(guid: &[u8; 16]) -> Option<u16> {
    if guid[2..4] == [0, 0] && guid[4..16] == KSDATAFORMAT_SUBTYPE_SUFFIX {
        Some(u16::from_le_bytes([guid[0], guid[1]]))
    }
    else {
        None
    }
}

/// The extensible part of a 40 byte format chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FmtExtensible {
    /// The number of valid bits in each `bits_per_sample` wide sample.
    pub valid_bits_per_sample: u16,
    /// The speaker positions of the channels.
    pub channel_mask: Channels,
    /// The GUID of the sub-format.
    pub sub_format: [u8; 16],
}

/// The format chunk extension. The shape is selected by the declared chunk size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FmtExtension {
    /// A 16 byte chunk without an extension.
    None,
    /// An 18 byte chunk with a zero extension length.
    Empty,
    /// A 40 byte chunk with the 22 byte extensible format extension.
    Extensible(FmtExtensible),
}

impl FmtExtension {
    /// Gets the length of the format chunk payload with this extension.
    pub fn chunk_len(&self) -> u32 {
        match self {
            FmtExtension::None => 16,
            FmtExtension::Empty => 18,
            FmtExtension::Extensible(_) => 40,
        }
    }
}

/// The "fmt " chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FmtChunk {
    /// The WAVE format tag.
    pub format: u16,
    pub n_channels: u16,
    /// The sample rate in Hz.
    pub sample_rate: u32,
    /// The average data rate in bytes per second.
    pub byte_rate: u32,
    /// The length of one frame in bytes.
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub extension: FmtExtension,
}

/// Gets the number of bytes a sample of `bits` bits is stored in.
fn bytes_per_sample(bits: u16) -> u32 {
    (u32::from(bits) + 7) / 8
}

impl FmtChunk {
    /// Instantiate a 16 byte format chunk for interleaved integer PCM.
    pub fn new_pcm(n_channels: u16, sample_rate: u32, bits_per_sample: u16) -> Self {
        let block_align = u32::from(n_channels) * bytes_per_sample(bits_per_sample);
        let block_align = u16::try_from(block_align).unwrap_or(u16::MAX);

        FmtChunk {
            format: AudioFormat::WAVE_FORMAT_PCM,
            n_channels,
            sample_rate,
            byte_rate: sample_rate.saturating_mul(u32::from(block_align)),
            block_align,
            bits_per_sample,
            extension: FmtExtension::None,
        }
    }

    /// Gets the encoding of the data chunk. For the extensible format, the encoding is resolved
    /// from the sub-format GUID.
    pub fn audio_format(&self) -> AudioFormat {
        match (AudioFormat::from_wave_format_tag(self.format), &self.extension) {
            (AudioFormat::Extensible, FmtExtension::Extensible(ext)) => {
                match sub_format_tag(&ext.sub_format).map(AudioFormat::from_wave_format_tag) {
                    Some(AudioFormat::Extensible) | Some(AudioFormat::Unknown(_)) | None => {
                        AudioFormat::Extensible
                    }
                    Some(format) => format,
                }
            }
            (format, _) => format,
        }
    }

    /// Gets the channel positions. Only the extensible format declares positions.
    pub fn channel_mask(&self) -> Option<Channels> {
        match &self.extension {
            FmtExtension::Extensible(ext) => Some(ext.channel_mask),
            FmtExtension::None | FmtExtension::Empty => None,
        }
    }
}

impl Chunk for FmtChunk {
    fn tag(&self) -> [u8; 4] {
        Self::TAG
    }

    fn payload_len(&self) -> u32 {
        self.extension.chunk_len()
    }

    fn write_payload(&self, writer: &mut dyn io::Write) -> Result<()> {
        writer.write_u16(self.format)?;
        writer.write_u16(self.n_channels)?;
        writer.write_u32(self.sample_rate)?;
        writer.write_u32(self.byte_rate)?;
        writer.write_u16(self.block_align)?;
        writer.write_u16(self.bits_per_sample)?;

        match &self.extension {
            FmtExtension::None => Ok(()),
            FmtExtension::Empty => writer.write_u16(0),
            FmtExtension::Extensible(ext) => {
                writer.write_u16(22)?;
                writer.write_u16(ext.valid_bits_per_sample)?;
                writer.write_u32(ext.channel_mask.bits())?;
                writer.write_buf(&ext.sub_format)
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl ChunkType for FmtChunk {
    const TAG: [u8; 4] = *b"fmt ";

    fn read<B: ReadBytes>(reader: &mut B, header: ChunkHeader) -> Result<Self> {
        // Every shape starts with the 16 byte core.
        if header.size < 16 {
            return validation_error("wav: malformed fmt chunk");
        }

        let format = reader.read_u16()?;
        let n_channels = reader.read_u16()?;
        let sample_rate = reader.read_u32()?;
        let byte_rate = reader.read_u32()?;
        let block_align = reader.read_u16()?;
        let bits_per_sample = reader.read_u16()?;

        if n_channels == 0 {
            return validation_error("wav: fmt chunk has no channels");
        }

        // The chunk size selects the shape of the extension.
        let extension = match header.size {
            16 => FmtExtension::None,
            18 => {
                // Extension data length should be 0.
                if reader.read_u16()? != 0 {
                    return validation_error("wav: extension size not 0 bytes for 18 byte fmt");
                }
                FmtExtension::Empty
            }
            40 => {
                // The size of the extension for the extensible format is exactly 22 bytes.
                if reader.read_u16()? != 22 {
                    return validation_error("wav: extension size not 22 bytes for 40 byte fmt");
                }

                let valid_bits_per_sample = reader.read_u16()?;

                // The number of valid bits must fit in the sample container.
                if valid_bits_per_sample > bits_per_sample {
                    return validation_error("wav: valid bits per sample exceeds bits per sample");
                }

                let channel_mask = Channels::from_bits_retain(reader.read_u32()?);

                let mut sub_format = [0u8; 16];
                reader.read_buf_exact(&mut sub_format)?;

                FmtExtension::Extensible(FmtExtensible {
                    valid_bits_per_sample,
                    channel_mask,
                    sub_format,
                })
            }
            _ => return validation_error("wav: malformed fmt chunk"),
        };

        let fmt = FmtChunk {
            format,
            n_channels,
            sample_rate,
            byte_rate,
            block_align,
            bits_per_sample,
            extension,
        };

        // The frame length of uncompressed formats is implied by the channel count and sample
        // width.
        if let AudioFormat::Pcm | AudioFormat::IeeeFloat = fmt.audio_format() {
            let frame_len = u32::from(n_channels) * bytes_per_sample(bits_per_sample);

            if u32::from(block_align) != frame_len {
                return validation_error("wav: block_align is invalid");
            }
        }

        Ok(fmt)
    }
}

impl fmt::Display for FmtChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "FmtChunk {{")?;
        writeln!(f, "\tformat: {},", self.audio_format())?;
        writeln!(f, "\tn_channels: {},", self.n_channels)?;
        writeln!(f, "\tsample_rate: {} Hz,", self.sample_rate)?;
        writeln!(f, "\tbyte_rate: {},", self.byte_rate)?;
        writeln!(f, "\tblock_align: {},", self.block_align)?;
        writeln!(f, "\tbits_per_sample: {},", self.bits_per_sample)?;
        if let Some(channels) = self.channel_mask() {
            writeln!(f, "\tchannels: {},", channels)?;
        }
        writeln!(f, "}}")
    }
}

/// The "fact" chunk. Compressed formats record the length of the stream in frames here.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FactChunk {
    pub n_frames: u32,
}

impl Chunk for FactChunk {
    fn tag(&self) -> [u8; 4] {
        Self::TAG
    }

    fn payload_len(&self) -> u32 {
        4
    }

    fn write_payload(&self, writer: &mut dyn io::Write) -> Result<()> {
        writer.write_u32(self.n_frames)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl ChunkType for FactChunk {
    const TAG: [u8; 4] = *b"fact";

    fn read<B: ReadBytes>(reader: &mut B, header: ChunkHeader) -> Result<Self> {
        if header.size != 4 {
            return validation_error("wav: malformed fact chunk");
        }

        Ok(FactChunk { n_frames: reader.read_u32()? })
    }
}

/// The "data" chunk holding the encoded audio.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct DataChunk {
    pub data: Vec<u8>,
}

impl fmt::Debug for DataChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataChunk").field("len", &self.data.len()).finish()
    }
}

impl Chunk for DataChunk {
    fn tag(&self) -> [u8; 4] {
        Self::TAG
    }

    fn payload_len(&self) -> u32 {
        self.data.len() as u32
    }

    fn write_payload(&self, writer: &mut dyn io::Write) -> Result<()> {
        writer.write_buf(&self.data)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl ChunkType for DataChunk {
    const TAG: [u8; 4] = *b"data";

    fn read<B: ReadBytes>(reader: &mut B, header: ChunkHeader) -> Result<Self> {
        Ok(DataChunk { data: read_payload(reader, header)? })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use chorale_core::audio::Channels;
    use chorale_core::codecs::AudioFormat;
    use chorale_core::errors::Error;
    use chorale_core::io::SourceStream;
    use chorale_format_riff::{write_chunk, Chunk, ChunkHeader, ChunkType};

    use super::{sub_format_guid, FactChunk, FmtChunk, FmtExtensible, FmtExtension};

    fn read_fmt(payload: &[u8]) -> chorale_core::errors::Result<FmtChunk> {
        let header = ChunkHeader { tag: FmtChunk::TAG, size: payload.len() as u32 };
        let mut reader = SourceStream::new(Box::new(Cursor::new(payload.to_vec())));
        FmtChunk::read(&mut reader, header)
    }

    fn pcm_core() -> Vec<u8> {
        let mut payload = Vec::new();
        payload.extend_from_slice(&1u16.to_le_bytes());
        payload.extend_from_slice(&2u16.to_le_bytes());
        payload.extend_from_slice(&44100u32.to_le_bytes());
        payload.extend_from_slice(&176400u32.to_le_bytes());
        payload.extend_from_slice(&4u16.to_le_bytes());
        payload.extend_from_slice(&16u16.to_le_bytes());
        payload
    }

    #[test]
    fn verify_fmt_shapes_by_size() {
        let plain = read_fmt(&pcm_core()).unwrap();
        assert_eq!(plain, FmtChunk::new_pcm(2, 44100, 16));

        let mut empty = pcm_core();
        empty.extend_from_slice(&[0, 0]);
        assert_eq!(read_fmt(&empty).unwrap().extension, FmtExtension::Empty);

        let mut nonzero = pcm_core();
        nonzero.extend_from_slice(&[2, 0]);
        assert!(matches!(read_fmt(&nonzero), Err(Error::ValidationError(_))));

        let mut odd = pcm_core();
        odd.extend_from_slice(&[0, 0, 0, 0]);
        assert!(matches!(read_fmt(&odd), Err(Error::ValidationError(_))));

        assert!(matches!(read_fmt(&pcm_core()[..12]), Err(Error::ValidationError(_))));
    }

    #[test]
    fn verify_block_align_is_checked() {
        // Stereo 16-bit PCM frames are 4 bytes long.
        let mut payload = pcm_core();
        payload[12..14].copy_from_slice(&1u16.to_le_bytes());
        assert!(matches!(read_fmt(&payload), Err(Error::ValidationError(_))));

        // Stereo 32-bit float frames are 8 bytes long.
        let mut payload = pcm_core();
        payload[0..2].copy_from_slice(&AudioFormat::WAVE_FORMAT_IEEE_FLOAT.to_le_bytes());
        payload[14..16].copy_from_slice(&32u16.to_le_bytes());
        assert!(matches!(read_fmt(&payload), Err(Error::ValidationError(_))));

        payload[12..14].copy_from_slice(&8u16.to_le_bytes());
        assert!(read_fmt(&payload).is_ok());

        // The block alignment of other formats is not implied.
        let mut alaw = pcm_core();
        alaw[0..2].copy_from_slice(&AudioFormat::WAVE_FORMAT_ALAW.to_le_bytes());
        alaw[12..14].copy_from_slice(&1u16.to_le_bytes());
        assert!(read_fmt(&alaw).is_ok());
    }

    #[test]
    fn verify_extensible_fmt() {
        let mut payload = pcm_core();
        payload[0..2].copy_from_slice(&0xfffeu16.to_le_bytes());
        payload.extend_from_slice(&22u16.to_le_bytes());
        payload.extend_from_slice(&12u16.to_le_bytes());
        payload.extend_from_slice(&0x3u32.to_le_bytes());
        payload.extend_from_slice(&sub_format_guid(AudioFormat::WAVE_FORMAT_PCM));

        let fmt = read_fmt(&payload).unwrap();

        assert_eq!(fmt.audio_format(), AudioFormat::Pcm);
        assert_eq!(fmt.channel_mask(), Some(Channels::FRONT_LEFT | Channels::FRONT_RIGHT));
        assert_eq!(fmt.payload_len(), 40);

        let mut buf = Vec::new();
        write_chunk(&mut buf, &fmt).unwrap();
        assert_eq!(&buf[8..], payload.as_slice());
    }

    #[test]
    fn verify_unknown_sub_format_stays_extensible() {
        let fmt = FmtChunk {
            format: AudioFormat::WAVE_FORMAT_EXTENSIBLE,
            extension: FmtExtension::Extensible(FmtExtensible {
                valid_bits_per_sample: 16,
                channel_mask: Channels::FRONT_CENTRE,
                sub_format: [0xff; 16],
            }),
            ..FmtChunk::new_pcm(1, 8000, 16)
        };

        assert_eq!(fmt.audio_format(), AudioFormat::Extensible);
    }

    #[test]
    fn verify_fact_size_is_checked() {
        let mut reader = SourceStream::new(Box::new(Cursor::new(vec![0u8; 8])));

        let header = ChunkHeader { tag: FactChunk::TAG, size: 8 };
        assert!(matches!(FactChunk::read(&mut reader, header), Err(Error::ValidationError(_))));

        let header = ChunkHeader { tag: FactChunk::TAG, size: 4 };
        assert_eq!(FactChunk::read(&mut reader, header).unwrap(), FactChunk { n_frames: 0 });
    }
}
