//! Integration tests for session resumption.
//!
//! These tests drive complete flows through the public API:
//! - Ticket issue, transfer and redemption over framed packets
//! - Replay and window behaviour
//! - Concurrent issue and redemption

use std::collections::HashSet;
use std::sync::Arc;

use tessera_protocol::{
    EncryptedTicketData, FrameCodec, M1Packet, Packet, ProtocolError, ResumeHandler, SessionKey,
    SigKey, TicketData, TicketKey, TicketTransferPacket, HOST_DATA_SIZE,
};

const HOST_DATA: [u8; HOST_DATA_SIZE] = *b"host-01\0";

fn create_handler(first: i64, capacity: usize) -> ResumeHandler {
    ResumeHandler::new(&TicketKey::from_bytes([0x24; 32]), first, capacity).unwrap()
}

fn create_session(seed: u8) -> TicketData {
    TicketData::new(SigKey::from_bytes([seed; 32]), SessionKey::generate())
}

/// Sends `bytes` through a frame codec the way a stream transport would.
fn over_the_wire(bytes: &[u8]) -> Vec<u8> {
    let codec = FrameCodec::new();
    let framed = codec.encode(bytes).unwrap();
    let (payload, consumed) = codec.decode(&framed).unwrap();
    assert_eq!(consumed, framed.len());
    payload
}

// =============================================================================
// End-to-End Flow Tests
// =============================================================================

#[test]
fn test_full_resume_flow() {
    let server = create_handler(0, 1000);
    let session = create_session(1);

    // Server issues a ticket after the full handshake and transfers it
    let ticket = server.issue_ticket(&session, HOST_DATA).unwrap();
    let tt = over_the_wire(&TicketTransferPacket::new(ticket).encode());

    // Client stores the ticket
    let (received, _) = TicketTransferPacket::decode(&tt, 0).unwrap();

    // Client reconnects with a resume M1
    let m1 = M1Packet::resume(received.ticket, None, Some(SigKey::from_bytes([9; 32])));
    let wire = over_the_wire(&m1.encode());

    let (packet, _) = Packet::decode(&wire, 0).unwrap();
    let m1 = match packet {
        Packet::M1(m1) => m1,
        other => panic!("expected M1, got {:?}", other),
    };
    let presented = m1.resume_ticket().unwrap();

    let resumed = server.check_ticket(presented).unwrap();
    assert_eq!(resumed, session);
    assert_eq!(resumed.client_sig_key(), &SigKey::from_bytes([1; 32]));

    // Replaying the same M1 fails
    assert_eq!(server.check_ticket(presented), Err(ProtocolError::InvalidTicket));
}

#[test]
fn test_window_example_scenario() {
    let server = create_handler(12, 100);
    let allocator = server.allocator();

    for index in [3, 12, 13, i64::MIN, i64::MAX] {
        assert!(!allocator.is_valid(index), "index {} valid before issue", index);
    }

    let ticket = server.issue_ticket(&create_session(2), HOST_DATA).unwrap();
    assert_eq!(ticket.ticket_index(), 12);
    assert!(!allocator.is_valid(11));
    assert!(allocator.is_valid(12));
    assert!(!allocator.is_valid(13));

    assert!(server.check_ticket(&ticket).is_ok());
    assert_eq!(server.check_ticket(&ticket), Err(ProtocolError::InvalidTicket));
}

#[test]
fn test_old_tickets_age_out() {
    let server = create_handler(0, 3);
    let tickets: Vec<EncryptedTicketData> = (0..5)
        .map(|i| server.issue_ticket(&create_session(i), HOST_DATA).unwrap())
        .collect();

    assert_eq!(server.check_ticket(&tickets[0]), Err(ProtocolError::InvalidTicket));
    assert_eq!(server.check_ticket(&tickets[1]), Err(ProtocolError::InvalidTicket));
    for ticket in &tickets[2..] {
        assert!(server.check_ticket(ticket).is_ok());
    }
}

#[test]
fn test_handlers_with_different_keys_are_isolated() {
    let a = create_handler(0, 10);
    let b = ResumeHandler::new(&TicketKey::from_bytes([0x99; 32]), 0, 10).unwrap();

    let ticket_a = a.issue_ticket(&create_session(1), HOST_DATA).unwrap();
    b.issue_ticket(&create_session(2), HOST_DATA).unwrap();

    // Same index, same header, different key
    assert_eq!(b.check_ticket(&ticket_a), Err(ProtocolError::InvalidTicket));
    assert!(b.allocator().is_valid(0));
    assert!(a.check_ticket(&ticket_a).is_ok());
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_issue_yields_consecutive_indices() {
    let server = Arc::new(create_handler(1000, 10_000));
    let tasks = 16;
    let per_task = 50;

    let mut handles = Vec::new();
    for t in 0..tasks {
        let server = Arc::clone(&server);
        handles.push(tokio::task::spawn_blocking(move || {
            (0..per_task)
                .map(|_| {
                    server
                        .issue_ticket(&create_session(t as u8), HOST_DATA)
                        .unwrap()
                        .ticket_index()
                })
                .collect::<Vec<i64>>()
        }));
    }

    let mut indices = Vec::new();
    for handle in handles {
        indices.extend(handle.await.unwrap());
    }

    let total = (tasks * per_task) as i64;
    let unique: HashSet<i64> = indices.iter().copied().collect();
    assert_eq!(unique.len(), indices.len(), "duplicate ticket index issued");
    assert_eq!(unique, (1000..1000 + total).collect::<HashSet<i64>>());
    assert_eq!(server.allocator().next_index(), 1000 + total);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_redeem_has_single_winner() {
    let server = Arc::new(create_handler(0, 100));
    let ticket = Arc::new(server.issue_ticket(&create_session(3), HOST_DATA).unwrap());

    let mut handles = Vec::new();
    for _ in 0..8 {
        let server = Arc::clone(&server);
        let ticket = Arc::clone(&ticket);
        handles.push(tokio::task::spawn_blocking(move || {
            server.check_ticket(&ticket).is_ok()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
    assert_eq!(server.allocator().outstanding(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_out_of_order_redemption() {
    let server = Arc::new(create_handler(0, 100));
    let tickets: Vec<EncryptedTicketData> = (0..20)
        .map(|i| server.issue_ticket(&create_session(i), HOST_DATA).unwrap())
        .collect();

    let mut handles = Vec::new();
    for ticket in tickets.into_iter().rev() {
        let server = Arc::clone(&server);
        handles.push(tokio::task::spawn_blocking(move || server.check_ticket(&ticket)));
    }

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }
    assert_eq!(server.allocator().outstanding(), 0);
}
