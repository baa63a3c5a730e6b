use bitflags::bitflags;

bitflags! {
    /// Capabilities a registered peer carries. Fan-out only targets
    /// `ENDORSING` peers; ledger queries may consult any
    /// `LEDGER_QUERY` peer.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct PeerRoles: u8 {
        const ENDORSING        = 0b0000_0001;
        const CHAINCODE_QUERY  = 0b0000_0010;
        const LEDGER_QUERY     = 0b0000_0100;
        const EVENT_SOURCE     = 0b0000_1000;
        const SERVICE_DISCOVERY = 0b0001_0000;
    }
}

impl Default for PeerRoles {
    fn default() -> Self {
        Self::ENDORSING | Self::CHAINCODE_QUERY | Self::LEDGER_QUERY | Self::EVENT_SOURCE
    }
}
