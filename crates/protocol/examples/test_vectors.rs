//! Generate wire test vectors for interop testing.
//!
//! Run with: cargo run --package tessera-protocol --example test_vectors

use tessera_protocol::*;

fn main() {
    // Fixed keys so every run prints the same bytes
    let ticket_key = TicketKey::from_bytes([0x42; TICKET_KEY_SIZE]);
    let handler = ResumeHandler::new(&ticket_key, 12, 100).expect("valid handler settings");
    let session = TicketData::new(
        SigKey::from_bytes([0x11; SIG_KEY_SIZE]),
        SessionKey::from_bytes([0x22; SESSION_KEY_SIZE]),
    );
    let host_data = [1, 2, 3, 4, 5, 6, 7, 8];

    // Test vector 1: A1
    print_test_vector("a1", &A1Packet::new().encode());

    // Test vector 2: plaintext ticket data
    print_test_vector("ticket_data", &session.encode());

    // Test vector 3: sealed ticket for index 12
    let ticket = handler
        .issue_ticket(&session, host_data)
        .expect("ticket issue failed");
    print_test_vector("encrypted_ticket_12", &ticket.encode());

    // Test vector 4: TicketTransfer carrying that ticket
    print_test_vector(
        "ticket_transfer",
        &TicketTransferPacket::new(ticket.clone()).encode(),
    );

    // Test vector 5: M1 full handshake with server key
    let handshake = M1Packet::handshake(
        EncKey::from_bytes([0xE0; ENC_KEY_SIZE]),
        Some(SigKey::from_bytes([0x5E; SIG_KEY_SIZE])),
    );
    print_test_vector("m1_handshake", &handshake.encode());

    // Test vector 6: M1 resume with client key
    let resume = M1Packet::resume(ticket, Some(EncKey::from_bytes([0xE0; ENC_KEY_SIZE])), None);
    print_test_vector("m1_resume", &resume.encode());

    // Test vector 7: framed A1
    let framed = FrameCodec::new()
        .encode(&A1Packet::new().encode())
        .expect("framing failed");
    print_test_vector("framed_a1", &framed);
}

fn print_test_vector(name: &str, bytes: &[u8]) {
    print!("export const {} = new Uint8Array([", name);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            print!(", ");
        }
        print!("{}", b);
    }
    println!("]);");
}
