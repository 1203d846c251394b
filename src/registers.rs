//! Register definitions for the IAM-20380
//!
//! The IAM-20380 exposes a single, flat 8-bit register space. Configuration
//! registers are declared with the `device-driver` DSL so that the driver can
//! set individual fields by name. Measurement registers are 16-bit big-endian
//! pairs (`*_H` followed by `*_L`) and are read byte-by-byte through
//! [`RegisterBus::read_word`](crate::bus::RegisterBus::read_word) from the
//! high-byte addresses at the bottom of this module.
//!
//! ## Register Map (subset used by this crate)
//! - `0x00..=0x02` factory self-test trim codes (read-only)
//! - `0x19` sample-rate divider, `0x1A` filter configuration, `0x1B` gyro range + self-test
//! - `0x41..=0x48` temperature and gyro outputs (read-only)
//! - `0x6B`/`0x6C` power management
//! - `0x75` identity

device_driver::create_device!(
    device_name: Iam20380,
    dsl: {
        config {
            type RegisterAddressType = u8;
            type DefaultByteOrder = BE;
        }

        /// `SELF_TEST_X_GYRO`: Factory trim code for the X axis (0x00)
        register SelfTestXGyro {
            const ADDRESS = 0x00;
            const SIZE_BITS = 8;

            /// Factory trim code
            xg_st_data: uint = 0..8,
        },

        /// `SELF_TEST_Y_GYRO`: Factory trim code for the Y axis (0x01)
        register SelfTestYGyro {
            const ADDRESS = 0x01;
            const SIZE_BITS = 8;

            /// Factory trim code
            yg_st_data: uint = 0..8,
        },

        /// `SELF_TEST_Z_GYRO`: Factory trim code for the Z axis (0x02)
        register SelfTestZGyro {
            const ADDRESS = 0x02;
            const SIZE_BITS = 8;

            /// Factory trim code
            zg_st_data: uint = 0..8,
        },

        /// `SMPLRT_DIV`: Sample Rate Divider (0x19)
        /// Internal sample rate / (1 + divider)
        register SmplrtDiv {
            const ADDRESS = 0x19;
            const SIZE_BITS = 8;

            /// Sample rate divider
            smplrt_div: uint = 0..8,
        },

        /// `CONFIG`: Filter and FSYNC configuration (0x1A)
        register Configuration {
            const ADDRESS = 0x1A;
            const SIZE_BITS = 8;

            /// Digital low pass filter configuration
            dlpf_cfg: uint = 0..3,
            /// FSYNC pin sampling
            ext_sync_set: uint = 3..6,
            /// FIFO mode (stop when full)
            fifo_mode: bool = 6,
            reserved_7: uint = 7..8,
        },

        /// `GYRO_CONFIG`: Gyroscope range and self-test (0x1B)
        register GyroConfig {
            const ADDRESS = 0x1B;
            const SIZE_BITS = 8;

            /// Filter bypass (inverted FCHOICE)
            fchoice_b: uint = 0..2,
            reserved_2: uint = 2..3,
            /// Full-scale range select (0=250, 1=500, 2=1000, 3=2000 dps)
            fs_sel: uint = 3..5,
            /// Z-axis self-test enable
            zg_st: bool = 5,
            /// Y-axis self-test enable
            yg_st: bool = 6,
            /// X-axis self-test enable
            xg_st: bool = 7,
        },

        /// `PWR_MGMT_1`: Power Management 1 (0x6B)
        register PwrMgmt1 {
            const ADDRESS = 0x6B;
            const SIZE_BITS = 8;

            /// Clock source select (0=internal, 1=PLL with X gyro reference)
            clksel: uint = 0..3,
            /// Temperature sensor disable
            temp_dis: bool = 3,
            /// Gyro drive and PLL standby
            gyro_standby: bool = 4,
            /// Cycle mode
            cycle: bool = 5,
            /// Sleep mode enable
            sleep: bool = 6,
            /// Device reset
            device_reset: bool = 7,
        },

        /// `PWR_MGMT_2`: Power Management 2 (0x6C)
        register PwrMgmt2 {
            const ADDRESS = 0x6C;
            const SIZE_BITS = 8;

            /// Z gyro standby
            stby_zg: bool = 0,
            /// Y gyro standby
            stby_yg: bool = 1,
            /// X gyro standby
            stby_xg: bool = 2,
            reserved_7_3: uint = 3..8,
        },

        /// `WHO_AM_I`: Device ID Register (0x75)
        /// Expected value: 0xFA
        register WhoAmI {
            const ADDRESS = 0x75;
            const SIZE_BITS = 8;

            /// Device ID (should read 0xFA)
            who_am_i: uint = 0..8,
        },
    }
);

pub use Iam20380 as RegisterDevice;

/// `TEMP_OUT_H`; the low byte follows at 0x42
pub const TEMP_OUT: u8 = 0x41;
/// `GYRO_XOUT_H`; the low byte follows at 0x44
pub const GYRO_XOUT: u8 = 0x43;
/// `GYRO_YOUT_H`; the low byte follows at 0x46
pub const GYRO_YOUT: u8 = 0x45;
/// `GYRO_ZOUT_H`; the low byte follows at 0x48
pub const GYRO_ZOUT: u8 = 0x47;

/// Order in which a raw sample is acquired: three gyro axes, then temperature
pub const SAMPLE_SEQUENCE: [u8; 4] = [GYRO_XOUT, GYRO_YOUT, GYRO_ZOUT, TEMP_OUT];
