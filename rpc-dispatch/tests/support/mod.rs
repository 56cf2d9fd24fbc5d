//! Interfaces and message types shared by the integration tests.
#![allow(dead_code, unused_macros)]

use rpc_dispatch::uuid::Uuid;
use rpc_dispatch::{interface, record, SyntaxId, Version};

/// Status reported by handlers when the call succeeded.
pub const STATUS_OK: u32 = 0;
/// Status reported by handlers for a logical "access denied" failure.
pub const STATUS_ACCESS_DENIED: u32 = 5;

pub const DIRECTORY_V1: SyntaxId = SyntaxId::new(
    Uuid::from_u128(0x12345778_1234_abcd_ef00_0123456789ab),
    Version::new(1, 0),
);

pub const CATALOG_V0: SyntaxId = SyntaxId::new(
    Uuid::from_u128(0x3919286a_b10c_11d0_9ba8_00c04fd92ef5),
    Version::new(0, 0),
);

record! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct EchoRequest {
        pub tag: u32,
        pub message: String,
    }
}

record! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct EchoResponse {
        pub tag: u32,
        pub message: String,
        pub status: u32,
    }
}

record! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct LookupRequest {
        pub names: Vec<String>,
        pub limit: Option<u32>,
    }
}

record! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct LookupResponse {
        pub ids: Vec<u32>,
        pub status: u32,
    }
}

record! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct WaitRequest {
        pub millis: u32,
    }
}

record! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct WaitResponse {
        pub status: u32,
    }
}

interface! {
    /// A small name service.
    pub trait Directory {
        name = "directory";
        syntax = DIRECTORY_V1;
        fallback = UnimplementedDirectory;
        operations {
            0 => fn echo(EchoRequest) -> EchoResponse;
            2 => fn lookup(LookupRequest) -> LookupResponse;
            3 => fn wait(WaitRequest) -> WaitResponse;
        }
        reserved {
            1 => Opnum1NotUsedOnWire;
        }
    }
}

record! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Ping {
        pub tag: u32,
        pub payload: String,
    }
}

record! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Pong {
        pub opnum: u16,
        pub tag: u32,
        pub payload: String,
        pub status: u32,
    }
}

/// Expands `$callback!` with every bound opnum of [`Catalog`] and its method name.
macro_rules! for_each_catalog_operation {
    ($callback:ident) => {
        $callback! {
            0 => op0, 1 => op1, 2 => op2, 3 => op3, 4 => op4, 5 => op5, 6 => op6,
            9 => op9, 10 => op10, 11 => op11, 12 => op12, 13 => op13, 14 => op14,
            15 => op15, 16 => op16, 17 => op17, 18 => op18, 19 => op19, 20 => op20,
            21 => op21, 22 => op22, 23 => op23, 24 => op24, 25 => op25, 26 => op26,
            27 => op27, 28 => op28, 29 => op29, 30 => op30, 31 => op31, 32 => op32,
            33 => op33, 34 => op34, 35 => op35, 36 => op36, 37 => op37, 38 => op38,
            39 => op39, 40 => op40, 41 => op41, 42 => op42, 43 => op43, 44 => op44,
            45 => op45, 46 => op46, 47 => op47, 48 => op48, 49 => op49, 50 => op50,
            51 => op51, 52 => op52
        }
    };
}

/// Opnums of [`Catalog`] that are never used on the wire.
pub const CATALOG_RESERVED: [u16; 2] = [7, 8];

/// Highest opnum of [`Catalog`].
pub const CATALOG_LAST_OPNUM: u16 = 52;

interface! {
    /// A wide interface occupying opnums 0 through 52.
    pub trait Catalog {
        name = "catalog";
        syntax = CATALOG_V0;
        fallback = UnimplementedCatalog;
        operations {
            0 => fn op0(Ping) -> Pong;
            1 => fn op1(Ping) -> Pong;
            2 => fn op2(Ping) -> Pong;
            3 => fn op3(Ping) -> Pong;
            4 => fn op4(Ping) -> Pong;
            5 => fn op5(Ping) -> Pong;
            6 => fn op6(Ping) -> Pong;
            9 => fn op9(Ping) -> Pong;
            10 => fn op10(Ping) -> Pong;
            11 => fn op11(Ping) -> Pong;
            12 => fn op12(Ping) -> Pong;
            13 => fn op13(Ping) -> Pong;
            14 => fn op14(Ping) -> Pong;
            15 => fn op15(Ping) -> Pong;
            16 => fn op16(Ping) -> Pong;
            17 => fn op17(Ping) -> Pong;
            18 => fn op18(Ping) -> Pong;
            19 => fn op19(Ping) -> Pong;
            20 => fn op20(Ping) -> Pong;
            21 => fn op21(Ping) -> Pong;
            22 => fn op22(Ping) -> Pong;
            23 => fn op23(Ping) -> Pong;
            24 => fn op24(Ping) -> Pong;
            25 => fn op25(Ping) -> Pong;
            26 => fn op26(Ping) -> Pong;
            27 => fn op27(Ping) -> Pong;
            28 => fn op28(Ping) -> Pong;
            29 => fn op29(Ping) -> Pong;
            30 => fn op30(Ping) -> Pong;
            31 => fn op31(Ping) -> Pong;
            32 => fn op32(Ping) -> Pong;
            33 => fn op33(Ping) -> Pong;
            34 => fn op34(Ping) -> Pong;
            35 => fn op35(Ping) -> Pong;
            36 => fn op36(Ping) -> Pong;
            37 => fn op37(Ping) -> Pong;
            38 => fn op38(Ping) -> Pong;
            39 => fn op39(Ping) -> Pong;
            40 => fn op40(Ping) -> Pong;
            41 => fn op41(Ping) -> Pong;
            42 => fn op42(Ping) -> Pong;
            43 => fn op43(Ping) -> Pong;
            44 => fn op44(Ping) -> Pong;
            45 => fn op45(Ping) -> Pong;
            46 => fn op46(Ping) -> Pong;
            47 => fn op47(Ping) -> Pong;
            48 => fn op48(Ping) -> Pong;
            49 => fn op49(Ping) -> Pong;
            50 => fn op50(Ping) -> Pong;
            51 => fn op51(Ping) -> Pong;
            52 => fn op52(Ping) -> Pong;
        }
        reserved {
            7 => Opnum7NotUsedOnWire;
            8 => Opnum8NotUsedOnWire;
        }
    }
}

/// All opnums of [`Catalog`] that route to a handler.
pub fn catalog_opnums() -> Vec<u16> {
    (0..=CATALOG_LAST_OPNUM)
        .filter(|opnum| !CATALOG_RESERVED.contains(opnum))
        .collect()
}

pub fn ping(tag: u32) -> Vec<u8> {
    rpc_dispatch::ndr::to_vec(&Ping {
        tag,
        payload: format!("ping-{tag}"),
    })
    .expect("ping encodes")
}
