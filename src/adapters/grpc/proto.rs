//! Protobuf encoding for the tessera.Lease wire types.
//!
//! This module provides manual prost::Message implementations for the
//! lease RPC messages to enable gRPC communication with standard clients
//! without proto codegen. The service definition is:
//!
//! ```text
//! service Lease {
//!   rpc Rent(RentRequest) returns (RentResponse);
//!   rpc Relet(ReletRequest) returns (ReletResponse);
//!   rpc Return(ReturnRequest) returns (ReturnResponse);
//! }
//! ```
//!
//! Ticket fields use proto3 default-value elision: a zero ticket is
//! absent from the wire.

use prost::{DecodeError, Message};

// ============================================================================
// RentRequest
// ============================================================================

/// Wire-format RentRequest. Rent takes no input.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct RentRequest {}

impl Message for RentRequest {
    fn encode_raw(&self, _buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: prost::encoding::WireType,
        buf: &mut impl prost::bytes::Buf,
        ctx: prost::encoding::DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        prost::encoding::skip_field(wire_type, tag, buf, ctx)
    }

    fn encoded_len(&self) -> usize {
        0
    }

    fn clear(&mut self) {}
}

// ============================================================================
// RentResponse
// ============================================================================

/// Wire-format RentResponse carrying the issued ticket.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct RentResponse {
    pub ticket: u32, // field 1
}

impl Message for RentResponse {
    fn encode_raw(&self, buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
        if self.ticket != 0 {
            prost::encoding::uint32::encode(1, &self.ticket, buf);
        }
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: prost::encoding::WireType,
        buf: &mut impl prost::bytes::Buf,
        ctx: prost::encoding::DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        match tag {
            1 => prost::encoding::uint32::merge(wire_type, &mut self.ticket, buf, ctx),
            _ => prost::encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        if self.ticket != 0 {
            prost::encoding::uint32::encoded_len(1, &self.ticket)
        } else {
            0
        }
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// ReletRequest
// ============================================================================

/// Wire-format ReletRequest naming the ticket to renew.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct ReletRequest {
    pub ticket: u32, // field 1
}

impl Message for ReletRequest {
    fn encode_raw(&self, buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
        if self.ticket != 0 {
            prost::encoding::uint32::encode(1, &self.ticket, buf);
        }
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: prost::encoding::WireType,
        buf: &mut impl prost::bytes::Buf,
        ctx: prost::encoding::DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        match tag {
            1 => prost::encoding::uint32::merge(wire_type, &mut self.ticket, buf, ctx),
            _ => prost::encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        if self.ticket != 0 {
            prost::encoding::uint32::encoded_len(1, &self.ticket)
        } else {
            0
        }
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// ReletResponse
// ============================================================================

/// Wire-format ReletResponse. A successful relet carries no payload.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct ReletResponse {}

impl Message for ReletResponse {
    fn encode_raw(&self, _buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: prost::encoding::WireType,
        buf: &mut impl prost::bytes::Buf,
        ctx: prost::encoding::DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        prost::encoding::skip_field(wire_type, tag, buf, ctx)
    }

    fn encoded_len(&self) -> usize {
        0
    }

    fn clear(&mut self) {}
}

// ============================================================================
// ReturnRequest
// ============================================================================

/// Wire-format ReturnRequest naming the ticket to return.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct ReturnRequest {
    pub ticket: u32, // field 1
}

impl Message for ReturnRequest {
    fn encode_raw(&self, buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
        if self.ticket != 0 {
            prost::encoding::uint32::encode(1, &self.ticket, buf);
        }
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: prost::encoding::WireType,
        buf: &mut impl prost::bytes::Buf,
        ctx: prost::encoding::DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        match tag {
            1 => prost::encoding::uint32::merge(wire_type, &mut self.ticket, buf, ctx),
            _ => prost::encoding::skip_field(wire_type, tag, buf, ctx),
        }
    }

    fn encoded_len(&self) -> usize {
        if self.ticket != 0 {
            prost::encoding::uint32::encoded_len(1, &self.ticket)
        } else {
            0
        }
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// ReturnResponse
// ============================================================================

/// Wire-format ReturnResponse. Return always acknowledges.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct ReturnResponse {}

impl Message for ReturnResponse {
    fn encode_raw(&self, _buf: &mut impl prost::bytes::BufMut)
    where
        Self: Sized,
    {
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: prost::encoding::WireType,
        buf: &mut impl prost::bytes::Buf,
        ctx: prost::encoding::DecodeContext,
    ) -> Result<(), DecodeError>
    where
        Self: Sized,
    {
        prost::encoding::skip_field(wire_type, tag, buf, ctx)
    }

    fn encoded_len(&self) -> usize {
        0
    }

    fn clear(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_messages_round_trip() {
        let msg = ReletRequest { ticket: 123_456 };
        let bytes = msg.encode_to_vec();
        let decoded = ReletRequest::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded, msg);

        let msg = RentResponse { ticket: 100_000 };
        let bytes = msg.encode_to_vec();
        let decoded = RentResponse::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn zero_ticket_encodes_empty() {
        let msg = RentResponse { ticket: 0 };
        assert_eq!(msg.encoded_len(), 0);
        let decoded = RentResponse::decode(&[][..]).unwrap();
        assert_eq!(decoded.ticket, 0);
    }

    #[test]
    fn empty_message_tolerates_unknown_fields() {
        // A RentRequest decoder must skip fields added by newer clients.
        let bytes = ReletRequest { ticket: 7 }.encode_to_vec();
        assert!(RentRequest::decode(bytes.as_slice()).is_ok());
    }
}
