//! Session resumption: issuing and checking resume tickets.
//!
//! A [`ResumeHandler`] owns one ticket cipher and one [`TicketIndexAllocator`].
//! After a full handshake the server calls [`ResumeHandler::issue_ticket`] and
//! sends the envelope to the client. When the client presents it again in an
//! M1 packet, [`ResumeHandler::check_ticket`] either returns the original
//! [`TicketData`] or rejects it with [`ProtocolError::InvalidTicket`].
//!
//! The ticket index is bound into the AEAD (nonce and associated data), so a
//! ciphertext cannot be moved to a different index, header or host context.

use crate::allocator::TicketIndexAllocator;
use crate::cipher::{ChaChaTicketCipher, TicketCipher, TicketKey};
use crate::config::{ResumeConfig, DEFAULT_TICKET_HEADER};
use crate::error::{ProtocolError, Result};
use crate::ticket::{associated_data, EncryptedTicketData, TicketData, HOST_DATA_SIZE};

/// Issues and redeems resume tickets for one host.
pub struct ResumeHandler<C: TicketCipher = ChaChaTicketCipher> {
    cipher: C,
    allocator: TicketIndexAllocator,
    ticket_header: u8,
}

impl ResumeHandler<ChaChaTicketCipher> {
    /// Creates a handler with the ChaCha20-Poly1305 cipher.
    pub fn new(key: &TicketKey, first_ticket_index: i64, capacity: usize) -> Result<Self> {
        let allocator = TicketIndexAllocator::new(first_ticket_index, capacity)?;
        tracing::debug!(
            key = %key.fingerprint(),
            first_ticket_index,
            capacity,
            "created resume handler"
        );
        Ok(Self::with_cipher(
            ChaChaTicketCipher::new(key),
            allocator,
            DEFAULT_TICKET_HEADER,
        ))
    }

    /// Creates a handler from configuration.
    pub fn from_config(key: &TicketKey, config: &ResumeConfig) -> Result<Self> {
        config.validate()?;
        let mut handler = Self::new(key, config.first_ticket_index, config.capacity)?;
        handler.ticket_header = config.ticket_header;
        Ok(handler)
    }
}

impl<C: TicketCipher> ResumeHandler<C> {
    /// Creates a handler from its parts.
    pub fn with_cipher(cipher: C, allocator: TicketIndexAllocator, ticket_header: u8) -> Self {
        Self {
            cipher,
            allocator,
            ticket_header,
        }
    }

    /// The format byte written into every issued ticket.
    pub fn ticket_header(&self) -> u8 {
        self.ticket_header
    }

    /// The allocator tracking issued tickets.
    pub fn allocator(&self) -> &TicketIndexAllocator {
        &self.allocator
    }

    /// Issues a ticket carrying `session`.
    ///
    /// The next index is allocated and the payload sealed in one critical
    /// section; if sealing fails no index is consumed.
    pub fn issue_ticket(
        &self,
        session: &TicketData,
        host_data: [u8; HOST_DATA_SIZE],
    ) -> Result<EncryptedTicketData> {
        let header = self.ticket_header;
        let ticket = self.allocator.issue_with(|index| {
            let aad = associated_data(header, index, &host_data);
            let mut plaintext = session.encode();
            let sealed = self.cipher.seal(index, &aad, &plaintext);
            zeroize::Zeroize::zeroize(&mut plaintext);
            EncryptedTicketData::new(header, index, host_data, sealed?)
        })?;

        tracing::debug!(
            index = ticket.ticket_index(),
            client = %session.client_sig_key(),
            "issued resume ticket"
        );
        Ok(ticket)
    }

    /// Checks a presented ticket and redeems it.
    ///
    /// Every rejection is the same `InvalidTicket` error: wrong header, index
    /// outside the window, index already redeemed or never issued, failed
    /// authentication, or a malformed payload. A rejected ticket leaves the
    /// allocator unchanged; an accepted one can never be accepted again.
    pub fn check_ticket(&self, ticket: &EncryptedTicketData) -> Result<TicketData> {
        if ticket.header() != self.ticket_header {
            tracing::debug!(
                header = ticket.header(),
                expected = self.ticket_header,
                "rejected ticket with unexpected header"
            );
            return Err(ProtocolError::InvalidTicket);
        }

        let index = ticket.ticket_index();
        let data = self.allocator.redeem_with(index, || {
            let aad = ticket.associated_data();
            let mut plaintext = self
                .cipher
                .open(index, &aad, ticket.encrypted_bytes())
                .map_err(|_| {
                    tracing::debug!(index, "ticket failed authentication");
                    ProtocolError::InvalidTicket
                })?;

            let decoded = if plaintext.len() == TicketData::SIZE {
                TicketData::decode(&plaintext, 0).map(|(data, _)| data)
            } else {
                Err(ProtocolError::MalformedInput(format!(
                    "ticket payload is {} bytes, expected {}",
                    plaintext.len(),
                    TicketData::SIZE
                )))
            };
            zeroize::Zeroize::zeroize(&mut plaintext);

            decoded.map_err(|e| {
                tracing::debug!(index, error = %e, "ticket payload malformed");
                ProtocolError::InvalidTicket
            })
        })?;

        tracing::debug!(index, client = %data.client_sig_key(), "redeemed resume ticket");
        Ok(data)
    }
}

impl<C: TicketCipher> std::fmt::Debug for ResumeHandler<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResumeHandler")
            .field("ticket_header", &self.ticket_header)
            .field("allocator", &self.allocator)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::TAG_SIZE;
    use crate::keys::{SessionKey, SigKey};

    const HOST_DATA: [u8; HOST_DATA_SIZE] = [1, 2, 3, 4, 5, 6, 7, 8];

    fn handler() -> ResumeHandler {
        ResumeHandler::new(&TicketKey::from_bytes([0x5A; 32]), 12, 100).unwrap()
    }

    fn session() -> TicketData {
        TicketData::new(SigKey::from_bytes([0x33; 32]), SessionKey::generate())
    }

    /// Cipher that refuses to seal, to exercise the failure path.
    struct FailingCipher;

    impl TicketCipher for FailingCipher {
        fn seal(&self, _: i64, _: &[u8], _: &[u8]) -> Result<Vec<u8>> {
            Err(ProtocolError::Encryption("no entropy".to_string()))
        }

        fn open(&self, _: i64, _: &[u8], _: &[u8]) -> Result<Vec<u8>> {
            Err(ProtocolError::InvalidTicket)
        }
    }

    /// Cipher that "authenticates" anything and returns a fixed plaintext.
    struct FixedPlaintextCipher(Vec<u8>);

    impl TicketCipher for FixedPlaintextCipher {
        fn seal(&self, _: i64, _: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
            let mut out = plaintext.to_vec();
            out.extend_from_slice(&[0u8; TAG_SIZE]);
            Ok(out)
        }

        fn open(&self, _: i64, _: &[u8], _: &[u8]) -> Result<Vec<u8>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_issue_then_check() {
        let handler = handler();
        let session = session();

        let ticket = handler.issue_ticket(&session, HOST_DATA).unwrap();
        assert_eq!(ticket.ticket_index(), 12);
        assert_eq!(ticket.header(), DEFAULT_TICKET_HEADER);
        assert_eq!(ticket.host_data(), &HOST_DATA);
        assert_eq!(ticket.size_of_encrypted_bytes(), TicketData::SIZE + TAG_SIZE);

        let recovered = handler.check_ticket(&ticket).unwrap();
        assert_eq!(recovered, session);
    }

    #[test]
    fn test_ticket_survives_wire_roundtrip() {
        let handler = handler();
        let session = session();
        let ticket = handler.issue_ticket(&session, HOST_DATA).unwrap();

        let bytes = ticket.encode();
        let (decoded, _) = EncryptedTicketData::decode(&bytes, 0).unwrap();
        assert_eq!(handler.check_ticket(&decoded).unwrap(), session);
    }

    #[test]
    fn test_ticket_redeemable_once() {
        let handler = handler();
        let first = handler.issue_ticket(&session(), HOST_DATA).unwrap();
        let second = handler.issue_ticket(&session(), HOST_DATA).unwrap();
        assert_eq!(first.ticket_index(), 12);
        assert_eq!(second.ticket_index(), 13);

        assert!(handler.allocator().is_valid(12));
        assert!(handler.check_ticket(&first).is_ok());
        assert_eq!(handler.check_ticket(&first), Err(ProtocolError::InvalidTicket));

        // Redeeming 12 does not affect 13
        assert!(handler.check_ticket(&second).is_ok());
    }

    #[test]
    fn test_tampered_ticket_rejected_without_redeeming() {
        let handler = handler();
        let ticket = handler.issue_ticket(&session(), HOST_DATA).unwrap();

        let mut tampered = ticket.clone();
        let mut bytes = tampered.encrypted_bytes().to_vec();
        bytes[5] ^= 0x01;
        tampered.set_encrypted_bytes(bytes).unwrap();

        assert_eq!(handler.check_ticket(&tampered), Err(ProtocolError::InvalidTicket));
        assert!(handler.allocator().is_valid(12));
        assert!(handler.check_ticket(&ticket).is_ok());
    }

    #[test]
    fn test_modified_host_data_rejected() {
        let handler = handler();
        let ticket = handler.issue_ticket(&session(), HOST_DATA).unwrap();

        let moved = EncryptedTicketData::new(
            ticket.header(),
            ticket.ticket_index(),
            [0xFF; HOST_DATA_SIZE],
            ticket.encrypted_bytes().to_vec(),
        )
        .unwrap();

        assert_eq!(handler.check_ticket(&moved), Err(ProtocolError::InvalidTicket));
        assert!(handler.allocator().is_valid(12));
    }

    #[test]
    fn test_ticket_moved_to_other_index_rejected() {
        let handler = handler();
        let first = handler.issue_ticket(&session(), HOST_DATA).unwrap();
        handler.issue_ticket(&session(), HOST_DATA).unwrap();

        // Replay the ciphertext of 12 under the still-valid index 13
        let moved = EncryptedTicketData::new(
            first.header(),
            13,
            *first.host_data(),
            first.encrypted_bytes().to_vec(),
        )
        .unwrap();

        assert_eq!(handler.check_ticket(&moved), Err(ProtocolError::InvalidTicket));
        assert!(handler.allocator().is_valid(12));
        assert!(handler.allocator().is_valid(13));
    }

    #[test]
    fn test_wrong_header_rejected() {
        let handler = handler();
        let ticket = handler.issue_ticket(&session(), HOST_DATA).unwrap();

        let other_header = EncryptedTicketData::new(
            0x7E,
            ticket.ticket_index(),
            *ticket.host_data(),
            ticket.encrypted_bytes().to_vec(),
        )
        .unwrap();

        assert_eq!(
            handler.check_ticket(&other_header),
            Err(ProtocolError::InvalidTicket)
        );
        assert!(handler.allocator().is_valid(12));
    }

    #[test]
    fn test_index_outside_window_rejected() {
        let key = TicketKey::from_bytes([0x5A; 32]);
        let handler = ResumeHandler::new(&key, 0, 2).unwrap();
        let oldest = handler.issue_ticket(&session(), HOST_DATA).unwrap();
        handler.issue_ticket(&session(), HOST_DATA).unwrap();
        handler.issue_ticket(&session(), HOST_DATA).unwrap();

        let before = handler.allocator().outstanding();
        assert_eq!(handler.check_ticket(&oldest), Err(ProtocolError::InvalidTicket));
        assert_eq!(handler.allocator().outstanding(), before);
    }

    #[test]
    fn test_ticket_from_other_host_rejected() {
        let ours = handler();
        let theirs = ResumeHandler::new(&TicketKey::generate(), 12, 100).unwrap();
        ours.issue_ticket(&session(), HOST_DATA).unwrap();

        let foreign = theirs.issue_ticket(&session(), HOST_DATA).unwrap();
        assert_eq!(ours.check_ticket(&foreign), Err(ProtocolError::InvalidTicket));
        assert!(ours.allocator().is_valid(12));
    }

    #[test]
    fn test_failed_seal_consumes_no_index() {
        let allocator = TicketIndexAllocator::new(12, 100).unwrap();
        let handler = ResumeHandler::with_cipher(FailingCipher, allocator, DEFAULT_TICKET_HEADER);

        let err = handler.issue_ticket(&session(), HOST_DATA).unwrap_err();
        assert!(matches!(err, ProtocolError::Encryption(_)));
        assert_eq!(handler.allocator().next_index(), 12);
        assert_eq!(handler.allocator().outstanding(), 0);
    }

    #[test]
    fn test_malformed_payload_rejected_without_redeeming() {
        let allocator = TicketIndexAllocator::new(0, 10).unwrap();
        let handler = ResumeHandler::with_cipher(
            FixedPlaintextCipher(vec![0u8; TicketData::SIZE - 1]),
            allocator,
            DEFAULT_TICKET_HEADER,
        );
        let ticket = handler.issue_ticket(&session(), HOST_DATA).unwrap();

        assert_eq!(handler.check_ticket(&ticket), Err(ProtocolError::InvalidTicket));
        assert!(handler.allocator().is_valid(0));
    }

    #[test]
    fn test_from_config_uses_header() {
        let config = ResumeConfig {
            first_ticket_index: 500,
            capacity: 64,
            ticket_header: 0x42,
        };
        let handler = ResumeHandler::from_config(&TicketKey::generate(), &config).unwrap();
        assert_eq!(handler.ticket_header(), 0x42);

        let ticket = handler.issue_ticket(&session(), HOST_DATA).unwrap();
        assert_eq!(ticket.header(), 0x42);
        assert_eq!(ticket.ticket_index(), 500);
        assert!(handler.check_ticket(&ticket).is_ok());
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let config = ResumeConfig {
            capacity: 0,
            ..ResumeConfig::default()
        };
        let err = ResumeHandler::from_config(&TicketKey::generate(), &config).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidConfig(_)));
    }
}
