use color_eyre::eyre::Result;

use crate::ui::Ui;

pub(crate) fn color_eyre_install() -> Result<()> {
    // Replace the default `color_eyre::install()?` panic and error hooks.
    // The new hooks release the captured terminal first. This prevents garbled backtrace prints.
    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default().into_hooks();

    // Replace `eyre_hook.install()?`.
    //
    // Reports are also created for recoverable problems, such as an unreadable
    // file offered to the widget, which end up as notifications. The terminal
    // stays captured for those. Fatal reports are propagated out of the event
    // loop only after it released the terminal.
    let eyre_hook = eyre_hook.into_eyre_hook();
    color_eyre::eyre::set_hook(Box::new(move |e| eyre_hook(e)))?;

    // Replace `panic_hook.install()`.
    let panic_hook = panic_hook.into_panic_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        if let Ok(terminal) = Ui::make_terminal() {
            // Nothing better to do than print the panic regardless.
            let _ = Ui::release_terminal(terminal);
        }

        panic_hook(panic_info);
    }));

    Ok(())
}
