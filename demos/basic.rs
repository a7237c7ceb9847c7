use pagealloc::Allocator;

fn log_alloc(addr: *mut u8, size: usize) {
    println!("Requested {size} bytes of memory");
    println!("Received this address: {addr:?}");
}

fn main() {
    let mut allocator = Allocator::new();

    let sizes = [8, 16, 40, 5000];
    let mut pointers = Vec::new();

    for size in sizes {
        let addr = allocator.allocate(size).expect("allocation failed");
        log_alloc(addr.as_ptr(), size);
        pointers.push(addr);
    }

    allocator.print_stats();

    for addr in pointers {
        unsafe { allocator.release(addr) };
    }

    // The first block is found again on the free list.
    let again = allocator.allocate(8).expect("allocation failed");
    println!("Reused address: {:?}", again.as_ptr());

    for (addr, size) in allocator.free_blocks() {
        println!("free block at {addr:#x}: {size} bytes");
    }

    allocator.print_stats();
}
