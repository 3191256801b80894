// net_chan.rs — Network channel implementation
// Converted from: myq2-original/qcommon/net_chan.c
//
// Handles reliable and unreliable message delivery over an unreliable
// datagram transport. Fragmentation/reassembly of oversized datagrams is
// handled below this layer (out of scope here); this module only tracks
// the sequencing state the reliable command and usercmd protocols sit on.

use crate::common::{msg_begin_reading, msg_read_long, msg_read_short, msg_write_long, msg_write_short};
use crate::qcommon::{NetAdr, NetChan, NetSrc, SizeBuf, MAX_MSGLEN};

/// Check if the last reliable message has been acknowledged.
pub fn netchan_can_reliable(chan: &NetChan) -> bool {
    chan.reliable_length == 0
}

/// Determine if we need to send a reliable message.
pub fn netchan_need_reliable(chan: &NetChan) -> bool {
    // If the remote side dropped the last reliable message, resend it
    if chan.incoming_acknowledged > chan.last_reliable_sequence
        && chan.incoming_reliable_acknowledged != chan.reliable_sequence
    {
        return true;
    }

    // If the reliable transmit buffer is empty, copy the current message out
    if chan.reliable_length == 0 && chan.message.cursize > 0 {
        return true;
    }

    false
}

/// Set up a new network channel.
pub fn netchan_setup(sock: NetSrc, chan: &mut NetChan, adr: NetAdr, qport: i32, curtime: i32) {
    *chan = NetChan::new();
    chan.sock = sock;
    chan.remote_address = adr;
    chan.qport = qport;
    chan.last_received = curtime;
    chan.incoming_sequence = 0;
    chan.outgoing_sequence = 1;
    chan.message = SizeBuf::new((MAX_MSGLEN - 16) as i32);
    chan.message.allow_overflow = true;
    // Protocol is set separately after negotiation via netchan_set_protocol
}

/// Set the negotiated protocol version for the channel.
pub fn netchan_set_protocol(chan: &mut NetChan, protocol: i32) {
    chan.protocol = protocol;
}

/// Build a packet for transmission and send it via NET_SendPacket.
pub fn netchan_transmit(chan: &mut NetChan, data: &[u8], curtime: i32, qport_value: i32) {
    if chan.message.overflowed && !chan.message.allow_overflow {
        panic!("Outgoing message overflow");
    }

    let send_reliable = netchan_need_reliable(chan);

    // If the reliable transmit buffer is empty and we have pending reliable data,
    // move it to the reliable buffer
    if chan.reliable_length == 0 && chan.message.cursize > 0 {
        let cursize = chan.message.cursize as usize;
        chan.reliable_buf[..cursize].copy_from_slice(&chan.message.data[..cursize]);
        chan.reliable_length = chan.message.cursize;
        chan.message.cursize = 0;
        chan.reliable_sequence ^= 1;
    }

    // Build the packet header
    let mut send = SizeBuf::new(MAX_MSGLEN as i32);

    let w1 = ((chan.outgoing_sequence as u32) & !(1u32 << 31)) | ((send_reliable as u32) << 31);
    let w2 = ((chan.incoming_sequence as u32) & !(1u32 << 31))
        | ((chan.incoming_reliable_sequence as u32) << 31);

    chan.outgoing_sequence += 1;
    chan.last_sent = curtime;

    msg_write_long(&mut send, w1 as i32);
    msg_write_long(&mut send, w2 as i32);

    // Send the qport if we are a client
    if matches!(chan.sock, NetSrc::Client) {
        msg_write_short(&mut send, qport_value);
    }

    // Copy the reliable message to the packet first
    if send_reliable {
        let reliable_len = chan.reliable_length as usize;
        send.write(&chan.reliable_buf[..reliable_len]);
        chan.last_reliable_sequence = chan.outgoing_sequence;
    }

    // Add the unreliable part if space is available
    let remaining = (send.maxsize - send.cursize) as usize;
    if remaining >= data.len() {
        send.write(data);
    } else {
        crate::common::com_printf("Netchan_Transmit: dumped unreliable\n");
    }

    let cursize = send.cursize as usize;
    let packet_data = &send.data[..cursize];
    crate::net::net_send_packet(chan.sock, packet_data, &chan.remote_address);
}

/// Process an incoming packet. Returns true if the packet is valid and should
/// be processed.
///
/// Modifies the message buffer to point past the header so the caller
/// can read the payload directly.
pub fn netchan_process(chan: &mut NetChan, msg: &mut SizeBuf, curtime: i32) -> bool {
    msg_begin_reading(msg);
    let mut sequence = msg_read_long(msg) as u32;
    let mut sequence_ack = msg_read_long(msg) as u32;

    if matches!(chan.sock, NetSrc::Server) {
        let _qport = msg_read_short(msg);
    }

    let reliable_message = sequence >> 31;
    let reliable_ack = sequence_ack >> 31;

    sequence &= !(1u32 << 31);
    sequence_ack &= !(1u32 << 31);

    // Discard stale or duplicated packets
    if (sequence as i32) <= chan.incoming_sequence {
        return false;
    }

    chan.dropped = (sequence as i32) - (chan.incoming_sequence + 1);

    // If the current outgoing reliable message has been acknowledged,
    // clear the buffer
    if reliable_ack == chan.reliable_sequence as u32 {
        chan.reliable_length = 0;
    }

    chan.incoming_sequence = sequence as i32;
    chan.incoming_acknowledged = sequence_ack as i32;
    chan.incoming_reliable_acknowledged = reliable_ack as i32;

    if reliable_message != 0 {
        chan.incoming_reliable_sequence ^= 1;
    }

    chan.last_received = curtime;

    true
}

/// Build an out-of-band packet (sequence = -1) and return its bytes.
pub fn netchan_out_of_band_data(data: &[u8]) -> Vec<u8> {
    let mut send = SizeBuf::new(MAX_MSGLEN as i32);
    msg_write_long(&mut send, -1); // -1 sequence means out of band
    send.write(data);
    let cursize = send.cursize as usize;
    send.data[..cursize].to_vec()
}

/// Build and send an out-of-band datagram.
pub fn netchan_out_of_band(sock: NetSrc, adr: &NetAdr, data: &[u8]) {
    let packet = netchan_out_of_band_data(data);
    crate::net::net_send_packet(sock, &packet, adr);
}

/// Build and send an out-of-band text message packet.
pub fn netchan_out_of_band_print(sock: NetSrc, adr: &NetAdr, message: &str) {
    netchan_out_of_band(sock, adr, message.as_bytes());
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qcommon::NetAdrType;

    fn make_test_chan() -> NetChan {
        let mut chan = NetChan::new();
        let adr = NetAdr {
            adr_type: NetAdrType::Ip,
            ip: [127, 0, 0, 1],
            ip6: [0; 16],
            scope_id: 0,
            port: 27960,
        };
        netchan_setup(NetSrc::Client, &mut chan, adr, 12345, 0);
        chan
    }

    #[test]
    fn test_can_reliable_empty() {
        let chan = make_test_chan();
        assert!(netchan_can_reliable(&chan));
    }

    #[test]
    fn test_need_reliable_empty() {
        let chan = make_test_chan();
        assert!(!netchan_need_reliable(&chan));
    }

    #[test]
    fn test_out_of_band() {
        let packet = netchan_out_of_band_data(b"hello");
        assert_eq!(packet[0], 0xFF);
        assert_eq!(packet[1], 0xFF);
        assert_eq!(packet[2], 0xFF);
        assert_eq!(packet[3], 0xFF);
        assert_eq!(&packet[4..], b"hello");
    }

    #[test]
    fn test_transmit_basic() {
        let mut chan = make_test_chan();
        netchan_transmit(&mut chan, b"test", 100, 12345);
        assert_eq!(chan.outgoing_sequence, 2);
    }
}
