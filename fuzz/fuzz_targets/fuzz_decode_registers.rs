#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Interpret the input as u16 register stream in big-endian pairs
    let regs: Vec<u16> = data
        .chunks_exact(2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .collect();

    // Every block decoder must reject short input instead of panicking
    let _ = vool_modbus::decode::decode_status_block(&regs);
    let _ = vool_modbus::decode::decode_energy_block(&regs);
    let _ = vool_modbus::decode::decode_control_block(&regs);

    if let [msb, lsb, ..] = regs[..] {
        let wh = vool_modbus::decode::compose_energy_wh(msb, lsb);
        assert!(vool_modbus::decode::energy_wh_to_kwh(wh) >= 0.0);
    }
});
