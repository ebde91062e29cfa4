//! Snowflake ids: 64-bit identifiers that sort by creation time.
//!
//! Layout, most significant bit first: 42 bits of milliseconds since the
//! epoch, 10 bits of node id, 12 bits of per-node sequence.

use derive_where::derive_where;
use std::{
    fmt::{Display, Formatter},
    marker::PhantomData,
    num::ParseIntError,
    str::FromStr,
};
use thiserror::Error;
use time::{Duration, OffsetDateTime};

pub const TIMESTAMP_BITS: u32 = 42;
pub const NODE_ID_BITS: u32 = 10;
pub const SEQUENCE_BITS: u32 = 12;

pub const SEQUENCE_SHIFT: u32 = 0;
pub const NODE_ID_SHIFT: u32 = SEQUENCE_SHIFT + SEQUENCE_BITS;
pub const TIMESTAMP_SHIFT: u32 = NODE_ID_SHIFT + NODE_ID_BITS;

pub const MAX_TIMESTAMP: u64 = (1 << TIMESTAMP_BITS) - 1;
pub const MAX_NODE_ID: u16 = (1 << NODE_ID_BITS) - 1;
pub const MAX_SEQUENCE: u16 = (1 << SEQUENCE_BITS) - 1;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum SnowflakeError {
    #[error("Specified time was before the snowflake epoch.")]
    TimeBeforeEpoch,
    #[error("Resulting timestamp uses too many bits.")]
    TimestampTooLarge,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Node id {0} is out of range (max {max})", max = MAX_NODE_ID)]
pub struct NodeIdOutOfRangeError(pub u16);

pub trait Epoch {
    const EPOCH_TIME: OffsetDateTime;
}

/// Milliseconds between the epoch and `time`, checked against the timestamp width.
pub fn millis_since_epoch<E: Epoch>(time: OffsetDateTime) -> Result<u64, SnowflakeError> {
    let millis = (time - E::EPOCH_TIME).whole_milliseconds();
    if millis < 0 {
        return Err(SnowflakeError::TimeBeforeEpoch);
    }

    u64::try_from(millis)
        .ok()
        .filter(|millis| *millis <= MAX_TIMESTAMP)
        .ok_or(SnowflakeError::TimestampTooLarge)
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct NodeId(u16);

impl NodeId {
    #[must_use]
    pub fn new(id: u16) -> Option<Self> {
        (id <= MAX_NODE_ID).then_some(Self(id))
    }

    #[must_use]
    pub fn get(self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for NodeId {
    type Error = NodeIdOutOfRangeError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(NodeIdOutOfRangeError(value))
    }
}

#[derive_where(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct Snowflake<SnowflakeEpoch>(u64, PhantomData<SnowflakeEpoch>);

impl<SnowflakeEpoch> Snowflake<SnowflakeEpoch> {
    #[must_use]
    pub fn new(inner: u64) -> Self {
        Self(inner, PhantomData)
    }

    /// Packs the parts, masking each to its field width.
    #[must_use]
    pub fn from_parts(timestamp: u64, node_id: NodeId, sequence: u16) -> Self {
        let snowflake = (timestamp & MAX_TIMESTAMP) << TIMESTAMP_SHIFT
            | u64::from(node_id.get()) << NODE_ID_SHIFT
            | u64::from(sequence & MAX_SEQUENCE) << SEQUENCE_SHIFT;

        Self::new(snowflake)
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn timestamp(self) -> u64 {
        self.0 >> TIMESTAMP_SHIFT
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn node_id(self) -> NodeId {
        NodeId(((self.0 >> NODE_ID_SHIFT) & u64::from(MAX_NODE_ID)) as u16)
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn sequence(self) -> u16 {
        ((self.0 >> SEQUENCE_SHIFT) & u64::from(MAX_SEQUENCE)) as u16
    }

    #[must_use]
    pub fn created_at(self) -> OffsetDateTime
    where
        SnowflakeEpoch: Epoch,
    {
        // 42 bits always fit into an i64.
        #[allow(clippy::cast_possible_wrap)]
        let millis = self.timestamp() as i64;
        SnowflakeEpoch::EPOCH_TIME + Duration::milliseconds(millis)
    }
}

impl<SnowflakeEpoch> Display for Snowflake<SnowflakeEpoch> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<SnowflakeEpoch> FromStr for Snowflake<SnowflakeEpoch> {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self::new)
    }
}

impl<SnowflakeEpoch> From<u64> for Snowflake<SnowflakeEpoch> {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl<SnowflakeEpoch> From<Snowflake<SnowflakeEpoch>> for u64 {
    fn from(value: Snowflake<SnowflakeEpoch>) -> Self {
        value.get()
    }
}

/// Hands out strictly increasing snowflakes for one node.
///
/// When the clock stands still (or goes backwards) the generator keeps using
/// the last timestamp and bumps the sequence; once the sequence is exhausted it
/// borrows the next millisecond.
#[derive_where(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct SnowflakeGenerator<SnowflakeEpoch> {
    node_id: NodeId,
    last_timestamp: Option<u64>,
    sequence: u16,
    phantom_data: PhantomData<SnowflakeEpoch>,
}

impl<SnowflakeEpoch> SnowflakeGenerator<SnowflakeEpoch> {
    #[must_use]
    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            last_timestamp: None,
            sequence: 0,
            phantom_data: PhantomData,
        }
    }

    pub fn generate_at(
        &mut self,
        time: OffsetDateTime,
    ) -> Result<Snowflake<SnowflakeEpoch>, SnowflakeError>
    where
        SnowflakeEpoch: Epoch,
    {
        let now = millis_since_epoch::<SnowflakeEpoch>(time)?;

        let timestamp = match self.last_timestamp {
            Some(last) if now <= last => {
                if self.sequence == MAX_SEQUENCE {
                    self.sequence = 0;
                    last + 1
                } else {
                    self.sequence += 1;
                    last
                }
            }
            _ => {
                self.sequence = 0;
                now
            }
        };

        if timestamp > MAX_TIMESTAMP {
            return Err(SnowflakeError::TimestampTooLarge);
        }
        self.last_timestamp = Some(timestamp);

        Ok(Snowflake::from_parts(timestamp, self.node_id, self.sequence))
    }

    pub fn generate(&mut self) -> Result<Snowflake<SnowflakeEpoch>, SnowflakeError>
    where
        SnowflakeEpoch: Epoch,
    {
        self.generate_at(OffsetDateTime::now_utc())
    }
}

#[cfg(test)]
mod tests {
    use crate::snowflake::{
        Epoch, MAX_NODE_ID, MAX_SEQUENCE, MAX_TIMESTAMP, NodeId, Snowflake, SnowflakeError,
        SnowflakeGenerator, millis_since_epoch,
    };
    use time::{Duration, OffsetDateTime, macros::datetime};

    struct MillennialEpoch;
    impl Epoch for MillennialEpoch {
        const EPOCH_TIME: OffsetDateTime = datetime!(2000-01-01 00:00 UTC);
    }

    #[test]
    fn node_id_range() {
        assert!(NodeId::new(0).is_some());
        assert!(NodeId::new(MAX_NODE_ID).is_some());
        assert!(NodeId::new(MAX_NODE_ID + 1).is_none());
        assert!(NodeId::try_from(u16::MAX).is_err());
    }

    #[test]
    fn epoch_offsets() {
        assert_eq!(
            millis_since_epoch::<MillennialEpoch>(MillennialEpoch::EPOCH_TIME),
            Ok(0)
        );
        assert_eq!(
            millis_since_epoch::<MillennialEpoch>(
                MillennialEpoch::EPOCH_TIME + Duration::milliseconds(1500)
            ),
            Ok(1500)
        );
        assert_eq!(
            millis_since_epoch::<MillennialEpoch>(
                MillennialEpoch::EPOCH_TIME - Duration::milliseconds(1)
            ),
            Err(SnowflakeError::TimeBeforeEpoch)
        );
        assert_eq!(
            millis_since_epoch::<MillennialEpoch>(
                MillennialEpoch::EPOCH_TIME + Duration::milliseconds(0x0400_0000_0000)
            ),
            Err(SnowflakeError::TimestampTooLarge)
        );
    }

    #[test]
    fn parts_survive_packing() {
        let node_id = NodeId::new(0b10_1010_1010).unwrap();
        let snowflake = Snowflake::<MillennialEpoch>::from_parts(MAX_TIMESTAMP, node_id, 100);

        assert_eq!(snowflake.timestamp(), MAX_TIMESTAMP);
        assert_eq!(snowflake.node_id(), node_id);
        assert_eq!(snowflake.sequence(), 100);

        let snowflake = Snowflake::<MillennialEpoch>::from_parts(1, NodeId::new(1).unwrap(), 1);
        assert_eq!(snowflake.get(), (1 << 22) | (1 << 12) | 1);
    }

    #[test]
    fn created_at_matches_generation_time() {
        let time = datetime!(2025-10-24 10:30 UTC);
        let mut generator = SnowflakeGenerator::<MillennialEpoch>::new(NodeId::new(3).unwrap());

        let snowflake = generator.generate_at(time).unwrap();
        assert_eq!(snowflake.created_at(), time);
        assert_eq!(snowflake.to_string().parse(), Ok(snowflake));
    }

    #[test]
    fn generator_is_strictly_increasing() {
        let time = datetime!(2025-10-24 10:55 UTC);
        let mut generator = SnowflakeGenerator::<MillennialEpoch>::new(NodeId::new(10).unwrap());

        let first = generator.generate_at(time).unwrap();
        let second = generator.generate_at(time).unwrap();
        assert_eq!(first.sequence(), 0);
        assert_eq!(second.sequence(), 1);
        assert_eq!(first.timestamp(), second.timestamp());
        assert!(second > first);

        // A clock going backwards must not produce a smaller id.
        let third = generator
            .generate_at(time - Duration::seconds(5))
            .unwrap();
        assert!(third > second);

        let later = generator
            .generate_at(time + Duration::milliseconds(1))
            .unwrap();
        assert_eq!(later.sequence(), 0);
        assert!(later > third);
    }

    #[test]
    fn exhausted_sequence_borrows_next_millisecond() {
        let time = datetime!(2025-10-24 11:00 UTC);
        let mut generator = SnowflakeGenerator::<MillennialEpoch>::new(NodeId::new(0).unwrap());

        let mut last = generator.generate_at(time).unwrap();
        for _ in 0..MAX_SEQUENCE {
            last = generator.generate_at(time).unwrap();
        }
        assert_eq!(last.sequence(), MAX_SEQUENCE);

        let next = generator.generate_at(time).unwrap();
        assert_eq!(next.sequence(), 0);
        assert_eq!(next.timestamp(), last.timestamp() + 1);
        assert!(next > last);
    }
}
