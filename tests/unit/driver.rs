//! Unit tests for the sensor driver API

use crate::common::{create_mock_driver, MockDelay, MockError, MockInterface};
use nmh1000::registers::{
    CONTROL_REG1, OUT_M_REG, STATUS, USER_HI_THRS, USER_LO_THRS, USER_ODR, WHO_AM_I,
};
use nmh1000::{
    Error, Nmh1000Driver, OperatingMode, OutputDataRate, SensorStatus, SwitchThresholds,
    I2C_ADDRESS_DEFAULT, WHO_AM_I_VALUE,
};

#[test]
fn test_driver_creation_checks_identity() {
    let interface = MockInterface::new();
    let log = interface.clone();

    let result = Nmh1000Driver::new(interface);

    assert!(result.is_ok());
    assert_eq!(log.reads(), vec![WHO_AM_I]);
    assert!(log.writes().is_empty(), "Creation must not configure");
}

#[test]
fn test_wrong_identity_rejected() {
    let interface = MockInterface::new();
    interface.set_who_am_i(0x12);

    let result = Nmh1000Driver::new(interface);
    assert!(matches!(result, Err(Error::InvalidDevice(0x12))));
}

#[test]
fn test_identity_read_failure() {
    let interface = MockInterface::new();
    interface.fail_next_read();

    let result = Nmh1000Driver::new(interface);
    assert!(matches!(result, Err(Error::Bus(MockError::Communication))));
}

#[test]
fn test_identity_registers() {
    let (mut driver, _interface) = create_mock_driver();

    assert_eq!(driver.read_who_am_i().unwrap(), WHO_AM_I_VALUE);
    assert_eq!(driver.read_device_address().unwrap(), I2C_ADDRESS_DEFAULT);
}

#[test]
fn test_soft_reset_restores_defaults() {
    let (mut driver, interface) = create_mock_driver();
    interface.set_register(USER_ODR, 0x13);
    interface.set_register(USER_LO_THRS, 0x22);

    driver.init(&mut MockDelay).unwrap();

    assert_eq!(interface.writes(), vec![(CONTROL_REG1, 0x80)]);
    assert_eq!(interface.get_register(USER_ODR), 0x00);
    assert_eq!(interface.get_register(USER_LO_THRS), 0x00);
    assert_eq!(interface.get_register(WHO_AM_I), WHO_AM_I_VALUE);
}

#[test]
fn test_soft_reset_timeout() {
    let (mut driver, interface) = create_mock_driver();
    interface.hold_reset(true);
    interface.clear_operations();

    let result = driver.init(&mut MockDelay);

    assert!(matches!(result, Err(Error::InitializationTimeout)));
    // One reset request, then ten polls of CONTROL_REG1
    assert_eq!(interface.writes().len(), 1);
    assert_eq!(interface.reads(), vec![CONTROL_REG1; 10]);
}

#[test]
fn test_register_access_by_offset() {
    let (mut driver, interface) = create_mock_driver();

    driver.write_register(USER_HI_THRS, 0x66).unwrap();
    assert_eq!(interface.get_register(USER_HI_THRS), 0x66);
    assert_eq!(driver.read_register(USER_HI_THRS).unwrap(), 0x66);
}

#[test]
fn test_read_magnetic() {
    let (mut driver, interface) = create_mock_driver();
    interface.set_mag_sequence(&[12, 34]);
    interface.clear_operations();

    assert_eq!(driver.read_magnetic().unwrap(), 12);
    assert_eq!(driver.read_magnetic().unwrap(), 34);
    assert_eq!(driver.read_magnetic().unwrap(), 34, "Last sample sticks");
    assert_eq!(interface.reads(), vec![OUT_M_REG; 3]);
}

#[test]
fn test_read_status() {
    let (mut driver, interface) = create_mock_driver();

    interface.set_register(STATUS, 0x03);
    assert_eq!(
        driver.read_status().unwrap(),
        SensorStatus {
            data_ready: true,
            switch_active: true
        }
    );

    interface.set_register(STATUS, 0x02);
    let status = driver.read_status().unwrap();
    assert!(!status.data_ready);
    assert!(status.switch_active);
}

#[test]
fn test_output_data_rate() {
    let (mut driver, interface) = create_mock_driver();
    interface.set_register(USER_ODR, 0xA0);

    driver.set_output_data_rate(OutputDataRate::Hsp5x).unwrap();

    assert_eq!(interface.get_register(USER_ODR), 0xB2, "Reserved bits kept");
    assert_eq!(driver.output_data_rate().unwrap(), OutputDataRate::Hsp5x);
}

#[test]
fn test_reserved_output_data_rate() {
    let (mut driver, interface) = create_mock_driver();
    interface.set_register(USER_ODR, 0x05);

    let result = driver.output_data_rate();
    assert!(matches!(result, Err(Error::InvalidConfig)));
}

#[test]
fn test_operating_mode() {
    let (mut driver, interface) = create_mock_driver();
    assert_eq!(driver.operating_mode().unwrap(), OperatingMode::Standby);

    driver.set_operating_mode(OperatingMode::Auto).unwrap();
    assert_eq!(interface.get_register(CONTROL_REG1), 0x02);
    assert_eq!(driver.operating_mode().unwrap(), OperatingMode::Auto);

    driver.set_operating_mode(OperatingMode::OneShot).unwrap();
    assert_eq!(interface.get_register(CONTROL_REG1), 0x01);
    assert_eq!(driver.operating_mode().unwrap(), OperatingMode::OneShot);

    driver.set_operating_mode(OperatingMode::Standby).unwrap();
    assert_eq!(interface.get_register(CONTROL_REG1), 0x00);
}

#[test]
fn test_switch_thresholds() {
    let (mut driver, interface) = create_mock_driver();
    let thresholds = SwitchThresholds {
        low: 0x10,
        high: 0x40,
    };

    driver.set_switch_thresholds(thresholds).unwrap();

    assert_eq!(interface.get_register(USER_LO_THRS), 0x10);
    assert_eq!(interface.get_register(USER_HI_THRS), 0x40);
    assert_eq!(driver.switch_thresholds().unwrap(), thresholds);
}

#[test]
fn test_inverted_switch_thresholds_rejected() {
    let (mut driver, interface) = create_mock_driver();
    interface.clear_operations();

    let result = driver.set_switch_thresholds(SwitchThresholds {
        low: 0x40,
        high: 0x10,
    });

    assert!(matches!(result, Err(Error::InvalidConfig)));
    assert!(interface.operations().is_empty());
}

#[test]
fn test_release_returns_interface() {
    let (driver, interface) = create_mock_driver();
    let released = driver.release();

    released.set_register(USER_LO_THRS, 0x01);
    assert_eq!(interface.get_register(USER_LO_THRS), 0x01);
}
