fn main() {
    smartstudy_monitor_lib::run()
}
